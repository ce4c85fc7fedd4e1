// Integration tests for the C interpreter

mod common;

use common::{compiled, record_writes, run, Event, Recorder};
use memscope::compiler::BuildError;
use memscope::config::InterpreterConfig;
use memscope::memory::MemoryError;
use memscope::interpreter::{
    AbortHandle, ExecError, Interpreter, RuntimeError, StepCommand, Stepper,
};
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

const FACTORIAL: &str = r#"
    int fact(int n) {
        int r;
        if (n <= 1) r = 1;
        else r = n * fact(n - 1);
        return r;
    }

    int main() {
        return fact(4);
    }
"#;

fn build_error(source: &str) -> BuildError {
    let mut interpreter = Interpreter::new(InterpreterConfig::default()).unwrap();
    interpreter.compile(source).unwrap_err()
}

fn runtime_error(interpreter: &mut Interpreter) -> RuntimeError {
    match interpreter.run() {
        Err(ExecError::Runtime(error)) => error,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn test_array_initializer_writes_words_in_order() {
    let mut interpreter = compiled(
        r#"
        int main() {
            int arr[4];
            arr = {10, 20, 30, 40};
            return 0;
        }
    "#,
    );
    let recorder = Recorder::default();
    interpreter.set_visualizer(Box::new(recorder.clone()));
    let writes = record_writes(&mut interpreter);

    assert_eq!(interpreter.run().unwrap(), Some(0));

    let events = recorder.events();
    let base = events
        .iter()
        .find_map(|e| match e {
            Event::Array {
                element,
                address,
                length: 4,
            } if element == "int" => Some(*address),
            _ => None,
        })
        .expect("array was not registered");

    let writes = writes.lock().unwrap().clone();
    assert_eq!(
        writes,
        vec![(base, 10), (base + 4, 20), (base + 8, 30), (base + 12, 40)]
    );
}

#[test]
fn test_initializers_see_earlier_side_effects() {
    let value = run(r#"
        int counter;
        int next() {
            counter = counter + 1;
            return counter;
        }
        int main() {
            int a[3];
            a = {next(), next() * 10, counter + 100};
            return a[0] + a[1] + a[2];
        }
    "#);
    assert_eq!(value, Some(1 + 20 + 102));
}

#[test]
fn test_array_initializer_may_be_short_or_empty() {
    let value = run(r#"
        int main() {
            int a[3];
            a = {7};
            a = {};
            return a[0] + a[1] + a[2];
        }
    "#);
    assert_eq!(value, Some(7));
}

#[test]
fn test_factorial_recursion() {
    let mut interpreter = compiled(FACTORIAL);
    assert_eq!(interpreter.run().unwrap(), Some(24));
    assert_eq!(interpreter.call("fact", &[5]).unwrap(), Some(120));
}

#[test]
fn test_recursive_locals_get_distinct_addresses() {
    let mut interpreter = compiled(FACTORIAL);
    let fact = interpreter.program().function_by_name("fact").unwrap();
    let descriptor = interpreter.program().function(fact);
    let r = descriptor.locals[1];
    assert_eq!(interpreter.program().symbol(r).name, "r");

    let recorder = Recorder::watching(r);
    interpreter.set_visualizer(Box::new(recorder.clone()));

    assert_eq!(interpreter.call("fact", &[4]).unwrap(), Some(24));

    let deepest = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::FrameEntered { watched, .. } => Some(watched),
            _ => None,
        })
        .max_by_key(|watched| watched.len())
        .unwrap();
    assert_eq!(deepest.len(), 4);
    let distinct: HashSet<_> = deepest.iter().collect();
    assert_eq!(distinct.len(), 4);

    // Every frame was torn down
    assert_eq!(interpreter.memory().live_regions(), 0);
    assert_eq!(interpreter.frames().depth(), 0);
}

#[test]
fn test_frames_exit_in_reverse_order() {
    let mut interpreter = compiled(FACTORIAL);
    let recorder = Recorder::default();
    interpreter.set_visualizer(Box::new(recorder.clone()));
    interpreter.run().unwrap();

    let trail: Vec<String> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::FrameEntered { function, depth, .. } => Some(format!("+{}{}", function, depth)),
            Event::FrameExited(function) => Some(format!("-{}", function)),
            _ => None,
        })
        .collect();
    assert_eq!(
        trail,
        vec![
            "+main1", "+fact2", "+fact3", "+fact4", "+fact5", "-fact", "-fact", "-fact", "-fact",
            "-main"
        ]
    );
}

#[test]
fn test_incompatible_assignment_is_a_compile_error() {
    let error = build_error(
        r#"
        int main() {
            int x;
            char *p;
            x = p;
            return 0;
        }
    "#,
    );
    assert!(matches!(error, BuildError::Compilation(_)));
    assert_eq!(
        error.message(),
        "incompatible types when assigning to type 'int' from type 'char*'"
    );
    assert_eq!(error.location().unwrap().line, 5);
}

#[test]
fn test_negative_array_size() {
    let error = build_error("int main() { int a[-1]; return 0; }");
    assert!(matches!(error, BuildError::Compilation(_)));
    assert_eq!(error.message(), "array size must be positive, got -1");
}

#[test]
fn test_too_many_initializers() {
    let error = build_error("int main() { int a[2]; a = {1, 2, 3}; return 0; }");
    assert_eq!(
        error.message(),
        "too many initializers for array of length 2, got 3"
    );
}

#[test]
fn test_lexical_and_syntax_errors() {
    assert!(matches!(
        build_error("int main() { return 1 @ 2; }"),
        BuildError::Lexical(_)
    ));
    assert!(matches!(
        build_error("int main() { return 1 }"),
        BuildError::Syntactic(_)
    ));
}

#[test]
fn test_failed_build_keeps_previous_program() {
    let mut interpreter = compiled(FACTORIAL);
    assert!(interpreter.compile("int main() { undefined = 1; }").is_err());
    assert_eq!(interpreter.run().unwrap(), Some(24));
}

#[test]
fn test_missing_return_value() {
    let mut interpreter = compiled(
        r#"
        int f(int x) {
            if (x) return 1;
        }
        int main() {
            return f(0);
        }
    "#,
    );
    let error = runtime_error(&mut interpreter);
    assert!(matches!(error, RuntimeError::MissingReturnValue { ref function } if function == "f"));
    assert_eq!(
        error.to_string(),
        "execution of function 'f' did not return any value"
    );
    assert_eq!(interpreter.memory().live_regions(), 0);
}

#[test]
fn test_arguments_evaluate_left_to_right() {
    let value = run(r#"
        int trail;
        int mark(int v) {
            trail = trail * 10 + v;
            return v;
        }
        int pair(int a, int b) {
            return trail * 100 + a * 10 + b;
        }
        int main() {
            trail = 0;
            return pair(mark(1), mark(2));
        }
    "#);
    assert_eq!(value, Some(1200 + 12));
}

#[test]
fn test_write_callback_fires_once_per_write() {
    let mut interpreter = compiled(
        r#"
        int main() {
            int x;
            char c;
            x = 5;
            c = 'a';
            x = x + 1;
            return x;
        }
    "#,
    );
    let writes = record_writes(&mut interpreter);
    assert_eq!(interpreter.run().unwrap(), Some(6));

    let values: Vec<i32> = writes.lock().unwrap().iter().map(|w| w.1).collect();
    assert_eq!(values, vec![5, 97, 6]);
}

#[test]
fn test_parameters_are_bound_through_writes() {
    let mut interpreter = compiled(
        r#"
        int id(int v) { return v; }
        int main() { return id(9); }
    "#,
    );
    let writes = record_writes(&mut interpreter);
    assert_eq!(interpreter.run().unwrap(), Some(9));
    let values: Vec<i32> = writes.lock().unwrap().iter().map(|w| w.1).collect();
    assert_eq!(values, vec![9]);
}

#[test]
fn test_stepper_abort_tears_down_every_frame() {
    let (commands, stepper) = Stepper::new(true);
    let mut interpreter = compiled(FACTORIAL);
    let recorder = Recorder::default();
    interpreter.set_visualizer(Box::new(recorder.clone()));
    interpreter.set_control(Box::new(stepper));

    // main's return, then `if` and assignment for fact(4), fact(3) and fact(2)
    for _ in 0..7 {
        commands.send(StepCommand::Step).unwrap();
    }
    commands.send(StepCommand::Abort).unwrap();

    let result = interpreter.run();
    assert!(matches!(result, Err(ExecError::Aborted)));

    let events = recorder.events();
    let entered = events
        .iter()
        .filter(|e| matches!(e, Event::FrameEntered { .. }))
        .count();
    let exited = events
        .iter()
        .filter(|e| matches!(e, Event::FrameExited(_)))
        .count();
    assert_eq!(entered, 5);
    assert_eq!(exited, 5);
    assert_eq!(interpreter.memory().live_regions(), 0);
    assert_eq!(interpreter.frames().depth(), 0);
    assert!(interpreter.call_stack().is_empty());
}

#[test]
fn test_abort_handle_stops_an_endless_loop() {
    let handle = AbortHandle::new();
    let mut interpreter = compiled(
        r#"
        int flag;
        int main() {
            int i;
            i = 0;
            while (1) {
                i = 1 - i;
            }
            return i;
        }
    "#,
    )
    .with_control(handle.clone());

    let remote = handle.clone();
    let aborter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        remote.abort();
    });

    let result = interpreter.run();
    aborter.join().unwrap();
    assert!(result.unwrap_err().is_abort());
    assert_eq!(interpreter.memory().live_regions(), 0);
}

#[test]
fn test_stack_overflow_is_reported() {
    let mut interpreter = Interpreter::new(InterpreterConfig::default().with_max_call_depth(64)).unwrap();
    interpreter
        .compile("int f(int n) { return f(n + 1); } int main() { return f(0); }")
        .unwrap();
    let error = runtime_error(&mut interpreter);
    assert!(matches!(error, RuntimeError::StackOverflow { limit: 64, .. }));
    assert_eq!(interpreter.memory().live_regions(), 0);
}

#[test]
fn test_out_of_memory_is_reported() {
    let mut interpreter = Interpreter::new(InterpreterConfig::default().with_memory_capacity(64)).unwrap();
    interpreter
        .compile("int main() { int big[100]; return 0; }")
        .unwrap();
    let error = runtime_error(&mut interpreter);
    assert!(matches!(error, RuntimeError::Memory { .. }));
}

#[test]
fn test_runtime_faults() {
    let mut interpreter = compiled("int main() { int *p; p = NULL; return *p; }");
    assert!(matches!(
        runtime_error(&mut interpreter),
        RuntimeError::NullDereference { .. }
    ));

    let mut interpreter = compiled("int main() { int z; z = 0; return 10 / z; }");
    assert!(matches!(
        runtime_error(&mut interpreter),
        RuntimeError::DivisionByZero { .. }
    ));

    let mut interpreter = compiled("int main() { int x; free(&x); return 0; }");
    assert!(matches!(
        runtime_error(&mut interpreter),
        RuntimeError::InvalidFree { .. }
    ));

    let mut interpreter = compiled("int main() { void *p; p = malloc(0); return 0; }");
    assert!(matches!(
        runtime_error(&mut interpreter),
        RuntimeError::InvalidMallocSize { size: 0, .. }
    ));

    // The member offset carries the address past the top of the address range
    let mut interpreter = compiled(
        r#"
        struct S { int a; int b[3]; int c; };
        struct S *p;
        int main() {
            p = p + 214748364;
            return p->c;
        }
    "#,
    );
    assert!(matches!(
        runtime_error(&mut interpreter),
        RuntimeError::Memory {
            error: MemoryError::Unmapped { .. },
            ..
        }
    ));
}

#[test]
fn test_missing_entry_point() {
    let mut interpreter = compiled("int helper() { return 1; }");
    assert!(matches!(
        runtime_error(&mut interpreter),
        RuntimeError::NoEntryPoint { ref name } if name == "main"
    ));
}

#[test]
fn test_reset_clears_everything() {
    let mut interpreter = compiled(
        r#"
        int main() {
            int *p;
            p = malloc(sizeof(int));
            *p = 3;
            return *p;
        }
    "#,
    );
    assert_eq!(interpreter.run().unwrap(), Some(3));
    assert_eq!(interpreter.heap_blocks().count(), 1);
    assert_eq!(interpreter.memory().live_regions(), 1);

    interpreter.reset();
    assert_eq!(interpreter.heap_blocks().count(), 0);
    assert_eq!(interpreter.memory().live_regions(), 0);
    assert!(interpreter.program().function_by_name("main").is_none());
    assert!(interpreter.program().function_by_name("malloc").is_some());
    assert!(matches!(
        runtime_error(&mut interpreter),
        RuntimeError::NoEntryPoint { .. }
    ));
}

#[test]
fn test_malloc_and_free_round_trip() {
    let mut interpreter = compiled(
        r#"
        struct Pair { int a; int b; };
        int main() {
            struct Pair *p;
            int sum;
            p = malloc(sizeof(struct Pair));
            p->a = 4;
            p->b = 5;
            sum = p->a + p->b;
            free(p);
            free(NULL);
            return sum;
        }
    "#,
    );
    let recorder = Recorder::default();
    interpreter.set_visualizer(Box::new(recorder.clone()));

    assert_eq!(interpreter.run().unwrap(), Some(9));
    assert_eq!(interpreter.heap_blocks().count(), 0);
    assert_eq!(interpreter.memory().live_regions(), 0);
    assert!(recorder
        .events()
        .iter()
        .any(|e| matches!(e, Event::StructInstance(name, _) if name == "Pair")));
}
