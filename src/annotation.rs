// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Per-entity analysis annotations: a fixed struct of optional fields,
//! one per semantic category (`reaching`, `reaches`, `expression`,
//! `jump_label`), attached to every instruction and block. The
//! `pop_expression` accessor is the move-out operation expression
//! building relies on to transfer ownership of a producer's expression
//! into its consumer.
use crate::expr::Expression;
use crate::label::JumpLabel;
use crate::reaches::ReachesDefinition;
use crate::reaching::ReachingDefinition;

#[derive(Debug, Default, Clone)]
pub struct Annotations {
    reaching: Option<ReachingDefinition>,
    reaches: Option<ReachesDefinition>,
    expression: Option<Expression>,
    jump_label: Option<JumpLabel>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reaching(&self) -> Option<&ReachingDefinition> {
        self.reaching.as_ref()
    }
    pub fn reaching_mut(&mut self) -> Option<&mut ReachingDefinition> {
        self.reaching.as_mut()
    }
    pub fn set_reaching(&mut self, value: ReachingDefinition) {
        self.reaching = Some(value);
    }

    pub fn reaches(&self) -> Option<&ReachesDefinition> {
        self.reaches.as_ref()
    }
    pub fn reaches_mut(&mut self) -> &mut ReachesDefinition {
        self.reaches.get_or_insert_with(ReachesDefinition::default)
    }

    pub fn expression(&self) -> Option<&Expression> {
        self.expression.as_ref()
    }
    pub fn set_expression(&mut self, value: Expression) {
        self.expression = Some(value);
    }
    /// Get-and-remove: the ownership transfer that makes lifting
    /// possible.
    pub fn pop_expression(&mut self) -> Option<Expression> {
        self.expression.take()
    }

    pub fn jump_label(&self) -> Option<&JumpLabel> {
        self.jump_label.as_ref()
    }
    pub fn set_jump_label(&mut self, value: JumpLabel) {
        self.jump_label = Some(value);
    }
}
