//! End-to-end pipeline tests: source text through checking into either
//! backend. The bytecode side is verified by hand-simulating the
//! generated instruction stream and comparing its output against the
//! interpreter's.

use std::collections::HashMap;
use std::io::Cursor;

use minigo::backend::{Bytecode, CodeGen, Interpreter, OpCode};
use minigo::frontend::{Lexer, Parser};
use minigo::sema::{CheckedProgram, SemanticChecker};
use pretty_assertions::assert_eq;

fn check(source: &str) -> CheckedProgram {
    let tokens = Lexer::new(source).tokenize().unwrap();
    let program = Parser::new(tokens).parse_program().unwrap();
    SemanticChecker::new().check(&program)
}

fn interpret(checked: &CheckedProgram, stdin: &str) -> String {
    let mut out = Vec::new();
    Interpreter::new(checked, Cursor::new(stdin.to_string()), &mut out)
        .run()
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

/// Execute a generated program with no read syscalls, collecting one
/// string per write syscall
fn simulate(bytecode: &Bytecode) -> Vec<String> {
    let mut ints: HashMap<i32, i32> = HashMap::new();
    let mut floats: HashMap<i32, f32> = HashMap::new();
    let mut mem_i: HashMap<i32, i32> = HashMap::new();
    let mut mem_f: HashMap<i32, f32> = HashMap::new();
    let mut out = Vec::new();
    let mut pc: i32 = 0;

    loop {
        let instr = bytecode.code[pc as usize];
        let (o1, o2, o3) = (instr.o1, instr.o2, instr.o3);
        match instr.op {
            OpCode::Halt => break,
            OpCode::Noop => {}

            OpCode::LdiI => {
                ints.insert(o1, o2);
            }
            OpCode::LdiF => {
                floats.insert(o1, f32::from_bits(o2 as u32));
            }
            OpCode::LdwI => {
                ints.insert(o1, mem_i[&o2]);
            }
            OpCode::LdwF => {
                floats.insert(o1, mem_f[&o2]);
            }
            OpCode::StwI => {
                mem_i.insert(o1, ints[&o2]);
            }
            OpCode::StwF => {
                mem_f.insert(o1, floats[&o2]);
            }
            OpCode::WidF => {
                floats.insert(o1, ints[&o2] as f32);
            }

            OpCode::AddI | OpCode::SubI | OpCode::MulI | OpCode::DivI | OpCode::ModI => {
                let (a, b) = (ints[&o2], ints[&o3]);
                let v = match instr.op {
                    OpCode::AddI => a + b,
                    OpCode::SubI => a - b,
                    OpCode::MulI => a * b,
                    OpCode::DivI => a / b,
                    _ => a % b,
                };
                ints.insert(o1, v);
            }
            OpCode::AddF | OpCode::SubF | OpCode::MulF | OpCode::DivF | OpCode::ModF => {
                let (a, b) = (floats[&o2], floats[&o3]);
                let v = match instr.op {
                    OpCode::AddF => a + b,
                    OpCode::SubF => a - b,
                    OpCode::MulF => a * b,
                    OpCode::DivF => a / b,
                    _ => a % b,
                };
                floats.insert(o1, v);
            }

            OpCode::EquI | OpCode::NeqI | OpCode::LthI | OpCode::LteI | OpCode::GthI
            | OpCode::GteI => {
                let (a, b) = (ints[&o2], ints[&o3]);
                let holds = match instr.op {
                    OpCode::EquI => a == b,
                    OpCode::NeqI => a != b,
                    OpCode::LthI => a < b,
                    OpCode::LteI => a <= b,
                    OpCode::GthI => a > b,
                    _ => a >= b,
                };
                ints.insert(o1, i32::from(holds));
            }
            OpCode::EquF | OpCode::NeqF | OpCode::LthF | OpCode::LteF | OpCode::GthF
            | OpCode::GteF => {
                let (a, b) = (floats[&o2], floats[&o3]);
                let holds = match instr.op {
                    OpCode::EquF => a == b,
                    OpCode::NeqF => a != b,
                    OpCode::LthF => a < b,
                    OpCode::LteF => a <= b,
                    OpCode::GthF => a > b,
                    _ => a >= b,
                };
                ints.insert(o1, i32::from(holds));
            }
            OpCode::EquS | OpCode::NeqS | OpCode::LthS | OpCode::LteS | OpCode::GthS
            | OpCode::GteS => {
                let a = strip_quotes(&bytecode.strings[ints[&o2] as usize]);
                let b = strip_quotes(&bytecode.strings[ints[&o3] as usize]);
                let holds = match instr.op {
                    OpCode::EquS => a == b,
                    OpCode::NeqS => a != b,
                    OpCode::LthS => a < b,
                    OpCode::LteS => a <= b,
                    OpCode::GthS => a > b,
                    _ => a >= b,
                };
                ints.insert(o1, i32::from(holds));
            }

            OpCode::Jump => {
                pc = o1;
                continue;
            }
            OpCode::Bot => {
                if ints[&o1] == 1 {
                    pc += o2;
                    continue;
                }
            }
            OpCode::Bof => {
                if ints[&o1] == 0 {
                    pc += o2;
                    continue;
                }
            }

            OpCode::Call => match o1 {
                4 => out.push(ints[&o2].to_string()),
                5 => out.push(floats[&o2].to_string()),
                6 => out.push(if ints[&o2] != 0 { "true" } else { "false" }.to_string()),
                7 => out.push(strip_quotes(&bytecode.strings[ints[&o2] as usize]).to_string()),
                code => panic!("read syscall {} in an output-only simulation", code),
            },
        }
        pc += 1;
    }
    out
}

#[test]
fn literal_sum_passes_and_prints() {
    let checked = check(
        "package main\nfunc main() {\n\tvar x int = 2 + 3\n\tfmt.Println(x)\n}",
    );
    assert!(checked.passed(), "{:?}", checked.diagnostics);
    assert_eq!(interpret(&checked, ""), "5\n");
}

#[test]
fn bool_declaration_with_int_initializer_fails_with_one_diagnostic() {
    let checked = check("package main\nfunc main() {\n\tvar x bool = 1\n}");
    assert!(!checked.passed());
    assert_eq!(checked.diagnostics.len(), 1);
    assert_eq!(
        checked.diagnostics[0].to_string(),
        "SEMANTIC ERROR (3): incompatible types when declaring variable 'x', var type is 'bool' and expression type is 'int'."
    );
}

#[test]
fn non_bool_condition_fails_with_one_diagnostic() {
    let checked = check("package main\nfunc main() {\n\tif 3 {\n\t\tfmt.Println(1)\n\t}\n}");
    assert!(!checked.passed());
    assert_eq!(checked.diagnostics.len(), 1);
    assert_eq!(
        checked.diagnostics[0].to_string(),
        "SEMANTIC ERROR (3): conditional expression in 'if' is 'int' instead of 'bool'."
    );
}

#[test]
fn nested_branches_agree_between_interpreter_and_bytecode() {
    let source = "package main\n\
        func main() {\n\
        \tvar x int = 2\n\
        \tif x == 1 {\n\
        \t\tfmt.Println(10)\n\
        \t} else {\n\
        \t\tif x == 2 {\n\
        \t\t\tfmt.Println(20)\n\
        \t\t} else {\n\
        \t\t\tfmt.Println(30)\n\
        \t\t}\n\
        \t}\n\
        \tfmt.Println(40)\n\
        }";
    let checked = check(source);
    assert!(checked.passed(), "{:?}", checked.diagnostics);

    let interpreted: Vec<String> = interpret(&checked, "")
        .lines()
        .map(String::from)
        .collect();
    let bytecode = CodeGen::generate(&checked).unwrap();
    assert_eq!(simulate(&bytecode), interpreted);
    assert_eq!(interpreted, vec!["20", "40"]);
}

#[test]
fn loops_and_widening_agree_between_interpreter_and_bytecode() {
    let source = "package main\n\
        func main() {\n\
        \tvar i int = 0\n\
        \tvar acc float32 = 0.5\n\
        \tfor i < 4 {\n\
        \t\tacc = acc * 2.0 + i\n\
        \t\ti++\n\
        \t}\n\
        \tfmt.Println(acc)\n\
        \tfmt.Println(i == 4)\n\
        }";
    let checked = check(source);
    assert!(checked.passed(), "{:?}", checked.diagnostics);

    let interpreted: Vec<String> = interpret(&checked, "")
        .lines()
        .map(String::from)
        .collect();
    let bytecode = CodeGen::generate(&checked).unwrap();
    assert_eq!(simulate(&bytecode), interpreted);
}

#[test]
fn arity_mismatch_is_always_flagged() {
    let checked = check(
        "package main\nfunc add(a int, b int) int { return a + b }\nfunc main() {\n\tx := add(1)\n}",
    );
    assert!(!checked.passed());
    assert_eq!(
        checked.diagnostics[0].to_string(),
        "SEMANTIC ERROR (4): function 'add' expected 2 arguments but received '1'."
    );
}

#[test]
fn redeclaration_references_the_earlier_line() {
    let checked = check(
        "package main\nfunc main() {\n\tvar x int\n\tvar y int\n\tvar x float32\n}",
    );
    assert!(!checked.passed());
    assert_eq!(
        checked.diagnostics[0].to_string(),
        "SEMANTIC ERROR (5): variable 'x' already declared at line 3."
    );
}

#[test]
fn repeated_literals_share_one_table_entry() {
    let checked = check(
        "package main\nfunc main() {\n\tfmt.Println(\"a\", \"b\", \"a\")\n}",
    );
    assert!(checked.passed());
    assert_eq!(checked.strings.len(), 2);
    let bytecode = CodeGen::generate(&checked).unwrap();
    assert_eq!(bytecode.strings, vec!["\"a\"", "\"b\""]);
    assert_eq!(simulate(&bytecode), vec!["a", "b", "a"]);
}

#[test]
fn diagnostics_serialize_with_line_and_message() {
    let checked = check("package main\nfunc main() {\n\tvar x bool = 1\n}");
    let json = serde_json::to_value(&checked.diagnostics).unwrap();
    assert_eq!(json[0]["line"], 3);
    assert!(json[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("incompatible types when declaring variable 'x'"));
}

#[test]
fn guessing_loop_reads_until_the_secret_matches() {
    let source = "package main\n\
        func main() {\n\
        \tvar secret int = 7\n\
        \tvar guess int\n\
        \tvar tries int = 0\n\
        \tfor guess != secret {\n\
        \t\tfmt.Scanln(&guess)\n\
        \t\ttries++\n\
        \t}\n\
        \tfmt.Println(tries)\n\
        }";
    let checked = check(source);
    assert!(checked.passed(), "{:?}", checked.diagnostics);
    assert_eq!(
        interpret(&checked, "3\n7\n"),
        "read (int): read (int): 2\n"
    );
}

#[test]
fn temperature_conversion_runs_on_float_input() {
    let source = "package main\n\
        func main() {\n\
        \tvar f float32\n\
        \tfmt.Scanln(&f)\n\
        \tvar c float32 = (f - 32.0) * 5.0 / 9.0\n\
        \tfmt.Println(c)\n\
        }";
    let checked = check(source);
    assert!(checked.passed(), "{:?}", checked.diagnostics);
    assert_eq!(interpret(&checked, "212\n"), "read (real): 100\n");
}
