//! Integration tests for the preprocessor pass
//!
//! Directive and macro callbacks are replayed in source order, the way an
//! external preprocessor would deliver them, and the resulting ranges are
//! applied through the text-editing engine.

use deadstrip::{Config, ConditionValue, PreprocessorPass, SmartRewriter, Span};

fn apply(source: &str, ranges: Vec<Span>) -> String {
    let mut rewriter = SmartRewriter::new(source);
    rewriter.remove_all(ranges);
    rewriter.apply().unwrap()
}

fn loc(source: &str, needle: &str) -> usize {
    source.find(needle).expect("needle missing")
}

fn loc_nth(source: &str, needle: &str, nth: usize) -> usize {
    let mut offset = 0;
    for _ in 0..nth {
        let pos = source[offset..].find(needle).expect("occurrence missing");
        offset += pos + needle.len();
    }
    offset + source[offset..].find(needle).expect("occurrence missing")
}

fn span_of(source: &str, needle: &str) -> Span {
    let start = loc(source, needle);
    Span::new(start, start + needle.len())
}

/// An `#elif` chain where the second branch is taken: only its content
/// survives, every directive line and sibling branch goes.
#[test]
fn test_elif_chain_keeps_only_taken_branch() {
    let source = "\
#if VERSION == 1
int v1;
#elif VERSION == 2
int v2;
#else
int v3;
#endif
";
    let mut pass = PreprocessorPass::new(source);
    pass.if_(
        loc(source, "#if "),
        span_of(source, "VERSION == 1"),
        ConditionValue::False,
    );
    pass.elif(
        loc(source, "#elif"),
        span_of(source, "VERSION == 2"),
        ConditionValue::True,
    );
    pass.else_(loc(source, "#else"));
    pass.endif(loc(source, "#endif"));

    assert_eq!(apply(source, pass.finalize()), "\nint v2;\n\n");
}

/// A full little translation unit: an untaken `#ifdef`/`#else` group, an
/// include-guard style `#ifndef`, and a mix of used and unused macros.
#[test]
fn test_conditionals_and_macro_lifetimes_together() {
    let source = "\
#define UNUSED_MACRO 1
#define USED_MACRO 2
#ifdef DEBUG
int debug_only;
#else
int release_only;
#endif
#ifndef GUARD
#define GUARD
#endif
int x = USED_MACRO;
";
    let mut pass = PreprocessorPass::new(source);
    pass.macro_defined("UNUSED_MACRO", Some(span_of(source, "#define UNUSED_MACRO 1")));
    pass.macro_defined("USED_MACRO", Some(span_of(source, "#define USED_MACRO 2")));
    pass.ifdef(loc(source, "#ifdef DEBUG"), "DEBUG");
    pass.else_(loc(source, "#else"));
    pass.endif(loc_nth(source, "#endif", 0));
    pass.ifndef(loc(source, "#ifndef GUARD"), "GUARD");
    pass.macro_defined("GUARD", Some(span_of(source, "#define GUARD")));
    pass.endif(loc_nth(source, "#endif", 1));
    pass.macro_expands("USED_MACRO");

    let result = apply(source, pass.finalize());
    assert!(result.contains("#define USED_MACRO 2"));
    assert!(result.contains("int release_only;"));
    assert!(result.contains("int x = USED_MACRO;"));
    assert!(!result.contains("UNUSED_MACRO 1"));
    assert!(!result.contains("debug_only"));
    assert!(!result.contains("GUARD"));
    assert!(!result.contains("#ifdef"));
    assert!(!result.contains("#endif"));
}

/// An untaken inner group nested inside a taken outer one: the inner group
/// is removed whole, the outer keeps its content.
#[test]
fn test_nested_groups() {
    let source = "\
#if FEATURE
int outer;
#ifdef MISSING
int inner;
#endif
#endif
";
    let mut pass = PreprocessorPass::new(source);
    pass.if_(
        loc(source, "#if "),
        span_of(source, "FEATURE"),
        ConditionValue::True,
    );
    pass.ifdef(loc(source, "#ifdef MISSING"), "MISSING");
    pass.endif(loc_nth(source, "#endif", 0));
    pass.endif(loc_nth(source, "#endif", 1));

    assert_eq!(apply(source, pass.finalize()), "\nint outer;\n\n\n");
}

/// A condition mentioning a whitelisted macro keeps the whole group, even
/// though the branch is untaken; unrelated unused macros still go.
#[test]
fn test_whitelisted_condition_spares_the_group() {
    let source = "\
#define SCRATCH 1
#if defined(ONLINE_JUDGE) && VERBOSE
int logging;
#endif
";
    let config = Config {
        macros_to_keep: vec!["ONLINE_JUDGE".to_string()],
        ..Config::default()
    };
    let mut pass = PreprocessorPass::with_config(source, &config);
    pass.macro_defined("SCRATCH", Some(span_of(source, "#define SCRATCH 1")));
    pass.if_(
        loc(source, "#if "),
        span_of(source, "defined(ONLINE_JUDGE) && VERBOSE"),
        ConditionValue::False,
    );
    pass.endif(loc(source, "#endif"));

    let result = apply(source, pass.finalize());
    assert!(result.contains("#if defined(ONLINE_JUDGE) && VERBOSE"));
    assert!(result.contains("int logging;"));
    assert!(result.contains("#endif"));
    assert!(!result.contains("SCRATCH"));
}

/// A macro that is redefined after an `#undef`: each lifetime is judged on
/// its own expansions.
#[test]
fn test_redefined_macro_lifetimes_are_independent() {
    let source = "\
#define N 1
int a = N;
#undef N
#define N 2
int b;
";
    let mut pass = PreprocessorPass::new(source);
    pass.macro_defined("N", Some(span_of(source, "#define N 1")));
    pass.macro_expands("N");
    pass.macro_undefined("N", Some(loc(source, "#undef N")));
    pass.macro_defined("N", Some(span_of(source, "#define N 2")));

    let result = apply(source, pass.finalize());
    // First lifetime was expanded, so its #define and #undef both stay.
    assert!(result.contains("#define N 1"));
    assert!(result.contains("#undef N"));
    // Second lifetime never expands and goes.
    assert!(!result.contains("#define N 2"));
    assert!(result.contains("int b;"));
}
