use std::sync::mpsc;
use std::thread;

use ruletree::{Field, Filter, Logic, Operator, RuleTree};

fn main() {
    let tree = RuleTree::builder("Root")
        .id("root")
        .group("Audience", |g| {
            g.id("audience")
                .logic(Logic::Or)
                .filter(Field::Gender, Operator::Equals, "f")
                .filter(Field::Country, Operator::Equals, "RU")
        })
        .build()
        .expect("failed to build rule tree");

    // Readers receive whole versions; each one is an immutable snapshot.
    let (tx, rx) = mpsc::channel::<(usize, RuleTree)>();
    let reader = thread::spawn(move || {
        for (version, snapshot) in rx {
            println!("v{version}: {}", snapshot.expression());
        }
    });

    let mut current = tree;
    let mut version = 0;
    tx.send((version, current.clone())).expect("reader is alive");

    let cities = ["Moskva", "Kazan", "Omsk"];
    for city in cities {
        let audience = current
            .find(&"audience".into())
            .expect("audience group exists");
        current = match current.insert_into(
            &audience,
            Filter::new(Field::City, Operator::Equals, city),
            None,
        ) {
            Ok(next) => next,
            Err(err) => {
                eprintln!("Insert failed: {err}");
                continue;
            }
        };
        version += 1;
        tx.send((version, current.clone())).expect("reader is alive");
    }
    drop(tx);

    reader.join().expect("reader thread panicked");
    println!("Final: {current}");
}
