use scribe_palette::{CommandCatalog, CommandSpec, NavigationController};

fn noop(name: &str) -> CommandSpec {
    CommandSpec::new(name, name.to_uppercase(), |_doc, _args| Ok(()))
}

fn three_command_catalog() -> CommandCatalog {
    let mut catalog = CommandCatalog::new();
    catalog.register(noop("table")).unwrap();
    catalog.register(noop("divider")).unwrap();
    catalog.register(noop("image")).unwrap();
    catalog
}

#[test]
fn wraps_up_from_the_first_index() {
    let catalog = three_command_catalog();
    let mut nav = NavigationController::new();
    nav.sync(&catalog.filter(""));

    assert_eq!(nav.selected_index(), 0);
    nav.select_previous();
    assert_eq!(nav.selected_index(), 2);
}

#[test]
fn wraps_down_from_the_last_index() {
    let catalog = three_command_catalog();
    let mut nav = NavigationController::new();
    nav.sync(&catalog.filter(""));

    nav.select_previous();
    assert_eq!(nav.selected_index(), 2);
    nav.select_next();
    assert_eq!(nav.selected_index(), 0);
}

#[test]
fn arrows_are_noops_on_an_empty_list() {
    let catalog = CommandCatalog::new();
    let mut nav = NavigationController::new();
    nav.sync(&catalog.filter(""));

    nav.select_next();
    nav.select_previous();
    assert_eq!(nav.selected_index(), 0);
}

#[test]
fn changed_result_set_resets_the_index() {
    let catalog = three_command_catalog();
    let mut nav = NavigationController::new();
    nav.sync(&catalog.filter(""));
    nav.select_next();
    nav.select_next();
    assert_eq!(nav.selected_index(), 2);

    nav.sync(&catalog.filter("div"));
    assert_eq!(nav.selected_index(), 0);
}

#[test]
fn unchanged_result_set_keeps_the_index() {
    let catalog = three_command_catalog();
    let mut nav = NavigationController::new();
    nav.sync(&catalog.filter(""));
    nav.select_next();

    nav.sync(&catalog.filter(""));
    assert_eq!(nav.selected_index(), 1);
}

#[test]
fn hover_moves_the_highlight_without_committing() {
    let catalog = three_command_catalog();
    let mut nav = NavigationController::new();
    nav.sync(&catalog.filter(""));

    nav.hover(2);
    assert_eq!(nav.selected_index(), 2);

    // Out of range: ignored.
    nav.hover(7);
    assert_eq!(nav.selected_index(), 2);
}
