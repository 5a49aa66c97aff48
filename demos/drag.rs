use ruletree::{Candidate, DropOutcome, Field, Filter, Operator, RuleEditor, RuleTree};

fn main() {
    let tree = RuleTree::builder("Root")
        .id("root")
        .group("Contact", |g| {
            g.id("contact")
                .filter(Field::Channel, Operator::Equals, "email")
        })
        .group("Frozen", |g| {
            g.id("frozen")
                .locked(true)
                .filter(Field::Country, Operator::Equals, "RU")
        })
        .child(Filter::new(Field::Name, Operator::Contains, "Roma").with_id("name"))
        .build()
        .expect("failed to build rule tree");

    let mut editor = RuleEditor::new(tree);
    println!("Before: {}", editor.expression());

    // Hovering both the group row and its inner zone: the inner zone wins.
    let candidates = [
        Candidate::Item {
            item_id: "contact".into(),
            is_group: true,
        },
        Candidate::InnerDropZone {
            group_id: "contact".into(),
        },
        Candidate::Root,
    ];
    editor.drag_start(&"name".into()).expect("name is draggable");
    report(editor.drag_end(&candidates));
    println!("After:  {}", editor.expression());

    // Dropping into a locked group is refused.
    editor.drag_start(&"name".into()).expect("name is draggable");
    report(editor.drag_end(&[Candidate::InnerDropZone {
        group_id: "frozen".into(),
    }]));

    // Nesting a group inside itself is refused by the move itself.
    editor.drag_start(&"contact".into()).expect("contact is draggable");
    report(editor.drag_end(&[Candidate::InnerDropZone {
        group_id: "contact".into(),
    }]));

    // No candidates: the drag ends without a change.
    editor.drag_start(&"name".into()).expect("name is draggable");
    report(editor.drag_end(&[]));
}

fn report(outcome: DropOutcome) {
    match outcome {
        DropOutcome::Moved(tree) => println!("Moved: {tree}"),
        DropOutcome::NoTarget => println!("No drop target"),
        DropOutcome::Rejected(err) => println!("Rejected: {err}"),
        DropOutcome::NotDragging => println!("No drag in progress"),
    }
}
