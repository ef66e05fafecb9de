//! End-to-end tests: source scripts compiled and executed through the
//! engine.


use sable::{CompilationError, Engine, LexError, ParseErrorKind, RuntimeError, SableError, Value};
use test_harness::{ScriptHarness, run_source};

#[test]
fn hello_world() {
    let run = ScriptHarness::new().run("hello.sbl");
    assert_eq!(run.value(), &Value::None);
    assert_eq!(run.output, "hello, sable\n");
}

#[test]
fn expression_precedence_and_types() {
    let run = ScriptHarness::new().run("expressions.sbl");
    run.value();
    assert_eq!(run.lines(), ["105", "96", "5", "15", "5", "-8"]);
}

#[test]
fn recursive_factorial() {
    let run = ScriptHarness::new().run("factorial.sbl");
    assert_eq!(run.value(), &Value::Int64(2_432_902_008_176_640_000));
}

#[test]
fn while_loop_with_break() {
    let run = ScriptHarness::new().run("fibonacci.sbl");
    assert_eq!(run.value(), &Value::Int64(12_586_269_025));
}

#[test]
fn lists_grow_shrink_and_index() {
    let run = ScriptHarness::new().run("lists.sbl");
    assert_eq!(run.value(), &Value::Int32(14));
    assert_eq!(run.output, "[0, 1, 4, 9]\n");
}

#[test]
fn maps_insert_and_lookup() {
    let run = ScriptHarness::new().run("maps.sbl");
    assert_eq!(run.value(), &Value::Int32(41));
    assert_eq!(run.output, "37 2\n");
}

#[test]
fn strings_and_casts() {
    let run = ScriptHarness::new().run("strings.sbl");
    run.value();
    assert_eq!(run.lines(), ["sable!", "s", "5", "true", "42x", "18"]);
}

#[test]
fn arguments_are_passed_by_value() {
    let run = ScriptHarness::new().run("by_value.sbl");
    assert_eq!(run.value(), &Value::Int32(1));
    assert_eq!(run.output, "101\n");
}

#[test]
fn unreachable_functions_are_not_compiled() {
    let harness = ScriptHarness::new();
    let program = harness.compile("dead_code.sbl");
    assert!(program.function("never_called").is_none());
    assert_eq!(program.capacity, 0);
    assert_eq!(harness.run("dead_code.sbl").value(), &Value::Int32(3));
}

#[test]
fn reads_input_until_quit() {
    let run = ScriptHarness::new().run_with_input("echo.sbl", "alpha\nbeta\nquit\nignored\n");
    assert_eq!(run.value(), &Value::Int32(2));
    assert_eq!(run.lines(), ["alpha", "beta"]);
}

#[test]
fn end_of_input_is_a_runtime_error() {
    let run = ScriptHarness::new().run_with_input("echo.sbl", "only\n");
    assert_eq!(run.result, Err(SableError::Runtime(RuntimeError::EndOfInput)));
    assert_eq!(run.output, "only\n");
}

#[test]
fn break_leaves_only_the_inner_loop() {
    let run = ScriptHarness::new().run("nested_loops.sbl");
    assert_eq!(run.value(), &Value::Int32(15));
}

#[test]
fn if_else_branches() {
    let run = ScriptHarness::new().run("branches.sbl");
    run.value();
    assert_eq!(run.lines(), ["negative", "zero", "positive"]);
}

#[test]
fn counting_loop_runs_n_times() {
    for n in [0, 1, 7, 100] {
        let source = format!(
            "func main() => int32 {{\n    let runs: int32 = 0;\n    for (let i: int32 = 0; i < {}; i = i + 1) {{\n        runs = runs + 1;\n    }}\n    return runs;\n}}\n",
            n
        );
        assert_eq!(run_source(&source).value(), &Value::Int32(n));
    }
}

#[test]
fn division_always_widens() {
    let source = "func main() {\n    println(10 / 2);\n    println(10.0 / 2.0);\n    println(7 / 2);\n}\n";
    let run = run_source(source);
    run.value();
    assert_eq!(run.lines(), ["5", "5", "3.5"]);
}

#[test]
fn uint8_arithmetic_keeps_its_tag() {
    let run = run_source("func main() => uint8 {\n    return uint8(5) + uint8(5) * uint8(2);\n}\n");
    assert_eq!(run.value(), &Value::UInt8(15));
}

#[test]
fn declared_return_type_converts_result() {
    let run = run_source("func main() => int64 {\n    return 3;\n}\n");
    assert_eq!(run.value(), &Value::Int64(3));
}

// =========================================================================
// Compile-time failures
// =========================================================================

fn compile_error(source: &str) -> SableError {
    Engine::new()
        .compile(source)
        .expect_err("source should not compile")
}

#[test]
fn unbalanced_brackets() {
    let err = compile_error("func main() {\n    println((1 + 2);\n}\n");
    assert!(matches!(
        err,
        SableError::Lex {
            line: 2,
            error: LexError::UnbalancedBrackets { .. }
        }
    ));
}

#[test]
fn trailing_operator() {
    let err = compile_error("func main() {\n    let x: int32 = 1 +;\n}\n");
    assert!(matches!(
        err,
        SableError::Lex {
            error: LexError::TrailingOperator { .. },
            ..
        }
    ));
}

#[test]
fn foreach_is_unimplemented() {
    let err = compile_error("func main() {\n    foreach x in xs {\n    }\n}\n");
    assert!(matches!(err, SableError::Parse(ref e) if e.kind == ParseErrorKind::Unimplemented));
}

#[test]
fn vector_of_strings_violates_constraint() {
    let err = compile_error("func main() {\n    let v: vector<string>;\n}\n");
    assert!(matches!(err, SableError::Type { line: 2, .. }));
}

#[test]
fn unclosed_block() {
    let err = compile_error("func main() {\n    while true {\n    println(1);\n}\n");
    assert!(matches!(
        err,
        SableError::Parse(ref e) if e.kind == ParseErrorKind::UnmatchedBrace && e.line == 1
    ));
}

#[test]
fn undefined_function() {
    let err = compile_error("func main() {\n    launch(1);\n}\n");
    assert_eq!(
        err,
        SableError::Compile(CompilationError::UndefinedFunction {
            name: "launch".to_string(),
            line: 2
        })
    );
}

// =========================================================================
// Runtime failures
// =========================================================================

#[test]
fn condition_must_be_bool() {
    let run = run_source("func main() {\n    if 1 {\n    }\n}\n");
    assert_eq!(
        run.result,
        Err(SableError::Runtime(RuntimeError::ConditionNotBool {
            found: "int32".to_string()
        }))
    );
}

#[test]
fn builtin_arity_checked_at_runtime() {
    let run = run_source("func main() {\n    len(1, 2);\n}\n");
    assert!(matches!(
        run.result,
        Err(SableError::Runtime(RuntimeError::ArityMismatch { got: 2, .. }))
    ));
}

#[test]
fn index_out_of_range() {
    let run = run_source("func main() {\n    let xs: list<int32>;\n    grow xs by 2;\n    println(xs[2]);\n}\n");
    assert_eq!(
        run.result,
        Err(SableError::Runtime(RuntimeError::IndexOutOfRange { index: 2, len: 2 }))
    );
}

#[test]
fn missing_map_key() {
    let run = run_source("func main() {\n    let m: map<string, int32>;\n    println(m[\"nope\"]);\n}\n");
    assert!(matches!(
        run.result,
        Err(SableError::Runtime(RuntimeError::KeyNotFound { .. }))
    ));
}

#[test]
fn runaway_recursion_hits_depth_limit() {
    let source = "func down(n: int32) => int32 {\n    return down(n + 1);\n}\nfunc main() => int32 {\n    return down(0);\n}\n";
    let mut engine = Engine::new().with_max_call_depth(32);
    let err = engine.run(source).unwrap_err();
    assert_eq!(err, SableError::Runtime(RuntimeError::CallDepthExceeded { limit: 32 }));
}

#[test]
fn recursion_reaches_the_default_depth_limit() {
    let limit = sable::VmOptions::default().max_call_depth;
    let source = |n: usize| {
        format!(
            "func down(n: int32) => int32 {{\n    if n == 0 {{\n        return 0;\n    }}\n    return down(n - 1) + 1;\n}}\nfunc main() => int32 {{\n    return down({});\n}}\n",
            n
        )
    };
    // main plus down(n)..down(0) is n + 2 frames.
    let deepest = limit - 2;
    assert_eq!(
        run_source(&source(deepest)).value(),
        &Value::Int32(deepest as i32)
    );
    assert_eq!(
        run_source(&source(deepest + 1)).result,
        Err(SableError::Runtime(RuntimeError::CallDepthExceeded { limit }))
    );
}

#[test]
fn comparisons_across_numeric_types() {
    for body in [
        "let a: uint8 = 200;\n    return a < 300;",
        "return 1 < 1.5;",
        "let i: int32 = -1;\n    let u: uint32 = 5;\n    return u > i;",
    ] {
        let source = format!("func main() => bool {{\n    {}\n}}\n", body);
        assert_eq!(run_source(&source).value(), &Value::Bool(true), "{}", body);
    }
}
