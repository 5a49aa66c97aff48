use ruletree::{Field, Logic, Operator, RuleEditor, RuleTree};

fn main() {
    // The starter tree a fresh rule builder opens with.
    let tree = RuleTree::builder("Корневая группа")
        .group("Подгруппа 1", |g| {
            g.logic(Logic::Or)
                .filter(Field::BirthDate, Operator::IsAfter, "2077-01-01")
                .filter(Field::Channel, Operator::Equals, "email")
        })
        .group("Подгруппа 2 (отключена)", |g| {
            g.disabled(true)
                .filter(Field::City, Operator::Equals, "MOSKVA")
        })
        .filter(Field::Name, Operator::Contains, "Roma")
        .build()
        .expect("failed to build rule tree");

    println!("{tree}");
    println!("Expression: {}", tree.expression());

    let mut editor = RuleEditor::new(tree);
    let root = editor.tree().root_id().clone();

    // Add a filter and fill it in, the way the filter editor does.
    let id = editor.add_filter(&root).expect("root accepts new filters");
    editor
        .save_filter(&id, Field::Email, Operator::EndsWith, "@mail.ru")
        .expect("filter is editable");
    println!("After adding a filter: {}", editor.display_expression());

    // Lock the root; further edits are refused.
    editor.toggle_locked(&root).expect("root can be locked");
    match editor.add_group(&root) {
        Ok(_) => println!("Unexpected: locked root accepted a group"),
        Err(err) => println!("Refused: {err}"),
    }

    match editor.dump() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("Dump failed: {err}"),
    }
}
