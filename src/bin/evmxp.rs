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
use std::fs;
use std::process::Command as SystemCommand;

use clap::{arg, Arg, ArgMatches, Command};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use evmxp::error::{Error, Result};
use evmxp::hex::FromHexString;
use evmxp::metadata;
use evmxp::{expr, label, printer, reaches, reaching, Program};

fn main() {
    let matches = Command::new("evmxp")
        .about("Reconstructs expression trees from EVM bytecode")
        .version("0.1.0")
        .arg(Arg::new("target").required(true))
        .arg(arg!(-c --code "Treat <target> as a raw hex string rather than a file path"))
        .arg(arg!(--"strip-swarm-hash" "Strip a trailing solc/Vyper metadata blob before disassembling"))
        .arg(arg!(--ctor "Treat the input as constructor bytecode and disassemble only the runtime part it deploys"))
        .arg(Arg::new("diff").long("diff").help("Diff the disassembly against another target of the same form"))
        .arg(Arg::new("solc").long("solc").help("Compile a Solidity source file with solc and disassemble its runtime bytecode"))
        .arg(arg!(--verbose "Show verbose output"))
        .get_matches();

    let verbose = matches.is_present("verbose");
    if verbose {
        init_logging(LevelFilter::Info);
    }

    let ok = run(&matches).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        false
    });

    std::process::exit(if ok { 0 } else { 1 });
}

fn run(args: &ArgMatches) -> Result<bool> {
    let bytes = if let Some(solc_file) = args.get_one::<String>("solc") {
        compile_with_solc(solc_file)?
    } else {
        load_bytes(args, "target")?
    };

    let text = disassemble_bytes(&bytes, args)?;

    if let Some(other_target) = args.get_one::<String>("diff") {
        let other_bytes = load_hex_or_file(other_target, args.is_present("code"))?;
        let other_text = disassemble_bytes(&other_bytes, args)?;
        print_diff(&text, &other_text);
    } else {
        print!("{text}");
    }

    Ok(true)
}

fn load_bytes(args: &ArgMatches, id: &str) -> Result<Vec<u8>> {
    let target = args.get_one::<String>(id).unwrap();
    load_hex_or_file(target, args.is_present("code"))
}

fn load_hex_or_file(target: &str, is_inline_code: bool) -> Result<Vec<u8>> {
    let mut hex = String::new();
    if is_inline_code {
        hex.push_str(target);
    } else {
        let context = fs::read_to_string(target)?;
        for line in context.lines() {
            hex.push_str(line.trim());
        }
    }
    hex.from_hex_string()
}

fn disassemble_bytes(bytes: &[u8], args: &ArgMatches) -> Result<String> {
    let stripped = if args.is_present("strip-swarm-hash") {
        metadata::strip_swarm_hash(bytes)
    } else {
        bytes
    };

    if args.is_present("ctor") {
        let mut ctor_program = Program::from_bytes(stripped);
        reaching::perform_reaching_analysis(&mut ctor_program)?;
        let (ctor, runtime) = metadata::split_constructor(stripped, &ctor_program)?;
        let mut out = String::new();
        out.push_str("# Constructor part\n");
        out.push_str(&disassemble_plain(ctor)?);
        out.push_str("# Code part\n");
        out.push_str(&disassemble_plain(runtime)?);
        Ok(out)
    } else {
        disassemble_plain(stripped)
    }
}

fn disassemble_plain(bytes: &[u8]) -> Result<String> {
    let mut program = Program::from_bytes(bytes);
    reaching::perform_reaching_analysis(&mut program)?;
    reaches::perform_reaches_analysis(&mut program);
    label::perform_label_creation(&mut program);
    expr::perform_expression_building(&mut program)?;
    Ok(printer::print_program(&program))
}

/// Invoke the system `solc` compiler and return the runtime bytecode
/// it produces for the given source file.
fn compile_with_solc(path: &str) -> Result<Vec<u8>> {
    let output = SystemCommand::new("solc")
        .arg("--bin-runtime")
        .arg(path)
        .output()?;
    if !output.status.success() {
        return Err(Error::HexDecode(format!(
            "solc exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let hex_line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| Error::HexDecode("solc produced no output".to_string()))?;
    hex_line.trim().from_hex_string()
}

fn print_diff(a: &str, b: &str) {
    let diff = similar::TextDiff::from_lines(a, b);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            similar::ChangeTag::Delete => "-",
            similar::ChangeTag::Insert => "+",
            similar::ChangeTag::Equal => " ",
        };
        print!("{sign}{change}");
    }
}

fn init_logging(level: LevelFilter) {
    let encoder = PatternEncoder::new("[{l}] {m}{n}");
    let stdout = ConsoleAppender::builder().encoder(Box::new(encoder)).build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .unwrap();
    let _handle = log4rs::init_config(config).unwrap();
}
