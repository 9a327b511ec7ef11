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
//! A generic depth-first abstract interpreter driver, shared by every
//! analysis that needs to walk the program's control-flow graph once
//! per distinct `(block, abstract-stack)` state.
use std::collections::HashSet;
use std::hash::Hash;

use crate::error::Result;

/// A single point in some abstract interpretation. `advance` computes
/// the zero or more successor states reachable from here; an empty
/// result means this path terminates (a terminator instruction, an
/// unresolved dynamic branch pruned rather than rejected, or falling
/// off the end of the program).
pub trait AbstractState: Sized + Eq + Hash + Clone {
    fn advance(&self) -> Result<Vec<Self>>;
}

/// Explore every reachable state depth-first from `initial`, calling
/// `advance` exactly once per distinct state. States are compared for
/// equality structurally (block identity plus abstract stack
/// contents), so two control-flow paths that rejoin with the same
/// stack shape are not re-explored.
pub fn execute_abstractly<S: AbstractState>(initial: S) -> Result<()> {
    let mut pending = vec![initial.clone()];
    let mut seen: HashSet<S> = HashSet::new();
    seen.insert(initial);

    while let Some(state) = pending.pop() {
        for next in state.advance()? {
            if seen.insert(next.clone()) {
                pending.push(next);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Clone, PartialEq, Eq, Hash)]
    struct Countdown(u32);

    thread_local! {
        static VISITS: RefCell<Vec<u32>> = RefCell::new(Vec::new());
    }

    impl AbstractState for Countdown {
        fn advance(&self) -> Result<Vec<Self>> {
            VISITS.with(|v| v.borrow_mut().push(self.0));
            if self.0 == 0 {
                Ok(vec![])
            } else {
                // Two paths converge back on the same value, which
                // must only be visited once.
                Ok(vec![Countdown(self.0 - 1), Countdown(self.0 - 1)])
            }
        }
    }

    #[test]
    fn revisits_are_suppressed() {
        VISITS.with(|v| v.borrow_mut().clear());
        execute_abstractly(Countdown(3)).unwrap();
        let visits = VISITS.with(|v| v.borrow().clone());
        assert_eq!(visits.len(), 4); // 3,2,1,0 each exactly once
    }
}
