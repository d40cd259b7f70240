//! End-to-end parse -> check -> emit tests for `RustEmitter`.

use checker::check;
use runner::{Emitter, RustEmitter};

fn emit(source: &str) -> String {
    let program = parser::parse(source, 1).expect("source should parse");
    let checked = check(&program).expect("program should check");
    return RustEmitter::default().emit(&program, &checked);
}

#[test]
fn emits_one_function_per_argument_type_specialization() {
    let output = emit(
        r#"
        fn add(a, b) {
            return a + b;
        }
        fn main() {
            x = add(1, 2);
            print(x);
        }
        "#,
    );

    assert!(output.contains("fn add_i64_i64(a: i64, b: i64) -> i64 {"), "{output}");
    assert!(output.contains("return (a + b);"), "{output}");
    assert!(output.contains("fn main() {"), "{output}");
    assert!(output.contains("let x = add_i64_i64(1, 2);"), "{output}");
    assert!(output.contains(r#"println!("{}", x);"#), "{output}");
}

#[test]
fn async_main_and_tokio_import_appear_only_when_a_spawn_is_reached() {
    let spawning = emit(
        r#"
        fn worker(n) {
            print(n);
        }
        fn main() {
            spawn worker(1);
        }
        "#,
    );
    assert!(spawning.contains("use tokio::sync::mpsc;"), "{spawning}");
    assert!(spawning.contains("#[tokio::main]\nasync fn main() {"), "{spawning}");
    assert!(spawning.contains("tokio::spawn(worker_i64(1));"), "{spawning}");

    let non_spawning = emit(
        r#"
        fn main() {
            x = 1;
            print(x);
        }
        "#,
    );
    assert!(!non_spawning.contains("use tokio::sync::mpsc;"), "{non_spawning}");
    assert!(non_spawning.contains("fn main() {"), "{non_spawning}");
    assert!(!non_spawning.contains("async fn main()"), "{non_spawning}");
}

#[test]
fn bounded_channel_send_awaits_and_unbounded_does_not() {
    let bounded = emit(
        r#"
        fn main() {
            ch = chan(1);
            ch <- 5;
        }
        "#,
    );
    assert!(bounded.contains("let (ch_tx, ch_rx) = mpsc::channel::<i64>(1);"), "{bounded}");
    assert!(bounded.contains("ch_tx.send(5).await.unwrap();"), "{bounded}");

    let unbounded = emit(
        r#"
        fn main() {
            ch = chan();
            ch <- 5;
        }
        "#,
    );
    assert!(unbounded.contains("let (ch_tx, ch_rx) = mpsc::unbounded_channel::<i64>();"), "{unbounded}");
    assert!(unbounded.contains("ch_tx.send(5).unwrap();"), "{unbounded}");
}

#[test]
fn struct_definitions_only_emit_methods_actually_called() {
    let output = emit(
        r#"
        struct Counter {
            count = 0;
            fn inc() {
                self.count = self.count + 1;
            }
            fn reset() {
                self.count = 0;
            }
        }
        fn main() {
            c = Counter { count: 0 };
            c.inc();
        }
        "#,
    );

    assert!(output.contains("pub struct Counter {"), "{output}");
    assert!(output.contains("pub fn inc(&mut self)"), "{output}");
    assert!(!output.contains("pub fn reset"), "unused methods must not be emitted: {output}");
}
