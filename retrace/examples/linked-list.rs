//! A recursive data structure built with a derived generator, and a buggy
//! function over it that retrace minimises to a one-cell list.

use retrace::*;

#[derive(Debug, Clone, PartialEq)]
enum List {
    Nil,
    Cons(i32, Box<List>),
}

impl List {
    fn len(&self) -> usize {
        match self {
            List::Nil => 0,
            List::Cons(_, tail) => 1 + tail.len(),
        }
    }

    /// Appends `other`, but forgets the last cell of `self`.
    fn buggy_append(&self, other: &List) -> List {
        match self {
            List::Nil => other.clone(),
            List::Cons(_, tail) if **tail == List::Nil => other.clone(),
            List::Cons(head, tail) => List::Cons(*head, Box::new(tail.buggy_append(other))),
        }
    }
}

fn list() -> Gen<List> {
    Gen::derive(|runner| {
        if runner.generate("more", Gen::bool()) {
            let head = runner.generate(
                "head",
                Gen::<i32>::range(-100, 100).expect("valid range"),
            );
            let tail = runner.generate("tail", list());
            List::Cons(head, Box::new(tail))
        } else {
            List::Nil
        }
    })
}

fn main() {
    println!("=== Linked list append ===\n");

    let result = property(|runner: &mut Runner| {
        let xs = runner.generate("xs", list());
        let ys = runner.generate("ys", list());
        xs.buggy_append(&ys).len() == xs.len() + ys.len()
    })
    .named("append preserves length")
    .run(&Config::default());

    println!("{result}");
}
