mod common;

use common::{compiled, run};
use memscope::interpreter::{ExecError, RuntimeError};

#[test]
fn test_arithmetic_coercion() {
    assert_eq!(run("int main() { char c; c = 'k'; return c + 0; }"), Some(107));
    assert_eq!(run("int main() { char c; c = 'a'; return 10 - c; }"), Some(-87));
    assert_eq!(run("int main() { char c; c = 300; return c; }"), Some(44));
    assert_eq!(run("int main() { char c; c = 200; return c; }"), Some(-56));
    assert_eq!(run("int main() { char c; c = 'a'; return c == 97; }"), Some(1));
    assert_eq!(run("int main() { return 7 / 2 * 2 + 7 % 2 - -3; }"), Some(10));
}

#[test]
fn test_logic_short_circuits() {
    let source = r#"
        int hits;
        int touch() {
            hits = hits + 1;
            return 1;
        }
        int main() {
            int a;
            a = 0 && touch();
            a = a + (1 || touch());
            a = a + (1 && touch());
            return a * 10 + hits;
        }
    "#;
    assert_eq!(run(source), Some(21));
}

#[test]
fn test_pointer_arithmetic() {
    let source = r#"
        int main() {
            int arr[5];
            int *p;
            int *p2;
            p = arr;
            p2 = p + 2;
            *p2 = 42;
            p2 = p2 + 1;
            *(p2 - 1) = *(p2 - 1) + 1;
            return arr[2] * 10 + (p2 - p);
        }
    "#;
    assert_eq!(run(source), Some(433));
}

#[test]
fn test_address_of_and_double_pointers() {
    let source = r#"
        void set(int **target, int *value) {
            *target = value;
        }
        int main() {
            int x;
            int *p;
            x = 11;
            p = NULL;
            set(&p, &x);
            *p = *p + 1;
            return x;
        }
    "#;
    assert_eq!(run(source), Some(12));
}

#[test]
fn test_sizeof() {
    let source = r#"
        struct Node { int value; char tag; struct Node *next; };
        int main() {
            int a[5];
            char s[3];
            return sizeof(struct Node) * 1000 + sizeof(a) * 10 + sizeof(s) + sizeof(char *);
        }
    "#;
    assert_eq!(run(source), Some(9000 + 200 + 3 + 4));
}

#[test]
fn test_struct_members_and_copy() {
    let source = r#"
        struct Point { int x; char tag; int y; };
        int main() {
            struct Point a;
            struct Point b;
            a.x = 7;
            a.tag = 'z';
            a.y = -2;
            b = a;
            a.x = 0;
            return b.x + b.tag + b.y;
        }
    "#;
    assert_eq!(run(source), Some(7 + 122 - 2));
}

#[test]
fn test_chained_struct_assignment() {
    let source = r#"
        struct P { int x; int y; };
        int main() {
            struct P a;
            struct P b;
            struct P c;
            c.x = 3;
            c.y = 4;
            a = b = c;
            return a.x + a.y + b.x * 10;
        }
    "#;
    assert_eq!(run(source), Some(3 + 4 + 30));
}

#[test]
fn test_struct_array_member() {
    let source = r#"
        struct Buffer { int used; char data[4]; };
        int main() {
            struct Buffer b;
            b.data = {'a', 'b', 'c', 0};
            b.used = 3;
            return b.data[1] + b.used;
        }
    "#;
    assert_eq!(run(source), Some(98 + 3));
}

#[test]
fn test_loops_break_and_continue() {
    let source = r#"
        int main() {
            int i;
            int sum;
            sum = 0;
            for (i = 0; i < 10; i = i + 1) {
                if (i % 2) continue;
                if (i > 6) break;
                sum = sum + i;
            }
            i = 0;
            while (i < 3) i = i + 1;
            do {
                sum = sum + 100;
            } while (0);
            return sum + i;
        }
    "#;
    assert_eq!(run(source), Some(0 + 2 + 4 + 6 + 100 + 3));
}

#[test]
fn test_string_literals_live_in_memory() {
    let source = r#"
        char *greeting;
        int main() {
            greeting = "hi";
            return greeting[0] * 1000 + greeting[1] * 10 + greeting[2];
        }
    "#;
    assert_eq!(run(source), Some(104 * 1000 + 105 * 10));
}

#[test]
fn test_integer_overflow_is_a_runtime_error() {
    let mut interpreter = compiled("int main() { int x; x = 2147483647; return x + 1; }");
    assert!(matches!(
        interpreter.run(),
        Err(ExecError::Runtime(RuntimeError::IntegerOverflow { operation: "+", .. }))
    ));
}
