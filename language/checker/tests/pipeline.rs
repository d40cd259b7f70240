//! End-to-end tests driving `parser::parse` into `checker::check`, covering
//! the concrete scenarios spec.md §8 names (monomorphization, shadow vs.
//! reassignment, channel element inference, mutable methods, reachability
//! pruning, spawn/channel interaction).

use syntax::atlas::MethodReceiver;
use syntax::ast::{AssignTarget, Stmt};
use syntax::symbol::ScopePath;
use syntax::types::BaseKind;

fn check(source: &str) -> checker::CheckedProgram {
    let program = parser::parse(source, 1).expect("source should parse");
    return checker::check(&program).expect("program should check");
}

#[test]
fn arithmetic_call_produces_one_specialization_per_argument_type() {
    let source = r#"
        fn add(a, b) {
            return a + b;
        }
        fn main() {
            x = add(1, 2);
            y = add(1.5, 2.5);
        }
    "#;
    let checked = check(source);

    let int_variant = checked.atlas.functions.get("add_i64_i64").expect("int specialization");
    assert_eq!(int_variant.return_type, BaseKind::Integer);

    let float_variant = checked.atlas.functions.get("add_f64_f64").expect("float specialization");
    assert_eq!(float_variant.return_type, BaseKind::Float);

    assert_eq!(checked.atlas.functions.len(), 3); // main + the two add specializations
}

#[test]
fn same_type_reassignment_marks_mutable_without_shadowing() {
    let source = r#"
        fn main() {
            x = 5;
            x = 6;
        }
    "#;
    let program = parser::parse(source, 1).unwrap();
    let checked = checker::check(&program).unwrap();

    let main_fn = program.functions.iter().find(|f| f.name == "main").unwrap();
    let mut assign_spans = main_fn.body.statements.iter().filter_map(|stmt| match stmt {
        Stmt::Assign { target: AssignTarget::Name(name), span, .. } if name == "x" => Some(*span),
        _ => None,
    });
    let first_span = assign_spans.next().unwrap();
    let second_span = assign_spans.next().unwrap();

    let scope = ScopePath::function("main");
    let first_binding = checked.state.symbols.get(scope.as_str(), first_span).unwrap();
    assert!(!first_binding.is_shadow);
    assert!(first_binding.is_mutated, "reassigning the same type should mark the original declaration mutable");

    let second_binding = checked.state.symbols.get(scope.as_str(), second_span).unwrap();
    assert!(!second_binding.is_shadow);
    assert_eq!(second_binding.resolved_type, BaseKind::Integer);
}

#[test]
fn type_changing_reassignment_shadows_instead_of_mutating() {
    let source = r#"
        fn main() {
            y = 1;
            y = 1.5;
        }
    "#;
    let program = parser::parse(source, 1).unwrap();
    let checked = checker::check(&program).unwrap();

    let main_fn = program.functions.iter().find(|f| f.name == "main").unwrap();
    let mut assign_spans = main_fn.body.statements.iter().filter_map(|stmt| match stmt {
        Stmt::Assign { target: AssignTarget::Name(name), span, .. } if name == "y" => Some(*span),
        _ => None,
    });
    let first_span = assign_spans.next().unwrap();
    let second_span = assign_spans.next().unwrap();

    let scope = ScopePath::function("main");
    let first_binding = checked.state.symbols.get(scope.as_str(), first_span).unwrap();
    assert!(!first_binding.is_mutated, "a type-changing reassignment never marks the original declaration mutable");

    let second_binding = checked.state.symbols.get(scope.as_str(), second_span).unwrap();
    assert!(second_binding.is_shadow);
    assert_eq!(second_binding.resolved_type, BaseKind::Float);
}

#[test]
fn channel_element_type_is_inferred_from_its_first_send() {
    let source = r#"
        fn main() {
            x = chan();
            x <- 5;
            y = <-x;
        }
    "#;
    let checked = check(source);

    let scope = ScopePath::function("main");
    let binding = checked.state.symbols.last_binding(scope.as_str(), "x").expect("x should be bound");
    match &binding.resolved_type {
        BaseKind::Channel(info) => {
            assert_eq!(info.element_type, BaseKind::Integer);
            assert!(!info.bounded, "chan() with no capacity argument is unbounded");
        }
        other => panic!("expected a channel type, got {other:?}"),
    }
}

#[test]
fn struct_method_writing_self_gets_a_mut_self_receiver_and_marks_caller_mutable() {
    let source = r#"
        struct Counter {
            count = 0;
            fn inc() {
                self.count = self.count + 1;
            }
        }
        fn main() {
            c = Counter { count: 0 };
            c.inc();
        }
    "#;
    let program = parser::parse(source, 1).unwrap();
    let checked = checker::check(&program).unwrap();

    let counter = checked.atlas.structs.get("Counter").expect("Counter should be reachable");
    assert!(counter.methods_used.contains("inc"));
    let inc = counter.methods.iter().find(|m| m.name == "inc").unwrap();
    assert_eq!(inc.receiver, MethodReceiver::MutSelf);

    let scope = ScopePath::function("main");
    let c_binding = checked.state.symbols.last_binding(scope.as_str(), "c").expect("c should be bound");
    assert!(c_binding.is_mutated, "calling a &mut self method must mark the receiver's declaration mutable");
}

#[test]
fn unreachable_functions_are_pruned_from_the_atlas() {
    let source = r#"
        fn unused(a) {
            return a;
        }
        fn main() {
            x = 1;
        }
    "#;
    let checked = check(source);

    assert_eq!(checked.atlas.functions.len(), 1);
    assert!(checked.atlas.functions.contains_key("main"));
    assert!(!checked.atlas.reachable_functions.contains("unused"));
}

#[test]
fn bounded_channel_passed_into_a_spawned_function_marks_it_async() {
    let source = r#"
        fn worker(rx) {
            v = <-rx;
            print(v);
        }
        fn main() {
            ch = chan(1);
            ch <- 42;
            spawn worker(ch);
        }
    "#;
    let checked = check(source);

    let worker = checked.atlas.functions.get("worker_Channel_i64").expect("worker should specialize over a bounded i64 channel");
    assert!(worker.is_async, "a function reached via spawn must be marked async");

    let channel_arg = worker.channel_arg_info.get(&0).expect("the spawned channel argument should carry channel info");
    assert!(channel_arg.bounded);
    assert_eq!(channel_arg.element_type, BaseKind::Integer);
}

#[test]
fn spawned_function_s_own_send_backfills_the_caller_s_unbounded_channel_type() {
    let source = r#"
        fn producer(ch) {
            ch <- 42;
        }
        fn main() {
            c = chan();
            spawn producer(c);
            x = <-c;
        }
    "#;
    let checked = check(source);

    let producer = checked.atlas.functions.get("producer_Channel_i64").expect("producer should specialize over an unbounded i64 channel");
    assert!(producer.is_async, "a function reached via spawn must be marked async");

    let scope = ScopePath::function("main");
    let c_binding = checked.state.symbols.last_binding(scope.as_str(), "c").expect("c should be bound");
    match &c_binding.resolved_type {
        BaseKind::Channel(info) => {
            assert!(!info.bounded, "chan() with no capacity argument is unbounded");
            assert_eq!(info.element_type, BaseKind::Integer, "the callee's own send must back-flow onto the caller's channel binding");
        }
        other => panic!("expected a channel type, got {other:?}"),
    }
}

#[test]
fn empty_array_literal_reassignment_is_a_shadow() {
    let source = r#"
        fn main() {
            items = [];
            items = [1, 2, 3];
        }
    "#;
    let program = parser::parse(source, 1).unwrap();
    let checked = checker::check(&program).unwrap();

    let main_fn = program.functions.iter().find(|f| f.name == "main").unwrap();
    let mut assign_spans = main_fn.body.statements.iter().filter_map(|stmt| match stmt {
        Stmt::Assign { target: AssignTarget::Name(name), span, .. } if name == "items" => Some(*span),
        _ => None,
    });
    let _first_span = assign_spans.next().unwrap();
    let second_span = assign_spans.next().unwrap();

    let scope = ScopePath::function("main");
    let second_binding = checked.state.symbols.get(scope.as_str(), second_span).unwrap();
    assert!(second_binding.is_shadow, "Array(Unknown) vs. Array(Integer) must not compare equal");
}
