use super::*;
use crate::app::{Model, ToastLevel};
use crate::nav::Navigator;
use crate::store::MemoryStore;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::style::Modifier;

const FIXTURE: &str = r#"{
    "shop": {
        "orders": [
            {"_id": "ObjectId('507f191e810c19729de860ea')", "name": "a", "tags": ["x", "y"]},
            {"_id": 2}
        ],
        "users": []
    }
}"#;

fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    Terminal::new(TestBackend::new(width, height)).unwrap()
}

fn create_test_model(store: &MemoryStore) -> Model {
    let nav = Navigator::connect(store, Some("shop")).unwrap();
    Model::new(nav, "fixture.json".to_string(), (80, 24))
}

fn buffer_lines(terminal: &Terminal<TestBackend>) -> Vec<String> {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.height)
        .map(|y| {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect()
        })
        .collect()
}

fn screen(terminal: &Terminal<TestBackend>) -> String {
    buffer_lines(terminal).join("\n")
}

#[test]
fn test_render_database_column_and_status() {
    let store = MemoryStore::from_json_str(FIXTURE).unwrap();
    let mut model = create_test_model(&store);
    let mut terminal = create_test_terminal(80, 12);
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let lines = buffer_lines(&terminal);
    assert!(lines[0].contains(" shop "));
    assert!(lines[1].contains("orders"));
    assert!(lines[2].contains("users"));
    let status = &lines[11];
    assert!(status.contains("fixture.json"));
    assert!(status.contains("?:help"));
}

#[test]
fn test_selected_item_in_focused_column_is_reversed() {
    let store = MemoryStore::from_json_str(FIXTURE).unwrap();
    let mut model = create_test_model(&store);
    let mut terminal = create_test_terminal(80, 12);
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let buffer = terminal.backend().buffer();
    assert!(buffer[(3, 1)].modifier.contains(Modifier::REVERSED));
    assert!(!buffer[(3, 2)].modifier.contains(Modifier::REVERSED));
}

#[test]
fn test_render_document_column_shows_key_value() {
    let store = MemoryStore::from_json_str(FIXTURE).unwrap();
    let mut model = create_test_model(&store);
    model.nav.activate(&store, 0, 0).unwrap();
    model.nav.activate(&store, 1, 0).unwrap();
    model.focus = 2;
    let mut terminal = create_test_terminal(120, 12);
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let text = screen(&terminal);
    assert!(text.contains("ObjectId('507f191e810c19729de860ea')"));
    assert!(text.contains("name: \"a\""));
    assert!(text.contains("tags: [\"x\",\"y\"]"));
    // Activated items carry a marker in their parent columns.
    assert!(text.contains("> orders"));
}

#[test]
fn test_narrow_terminal_scrolls_columns_to_focus() {
    let store = MemoryStore::from_json_str(FIXTURE).unwrap();
    let mut model = create_test_model(&store);
    model.nav.activate(&store, 0, 0).unwrap();
    model.nav.activate(&store, 1, 0).unwrap();
    model.focus = 2;
    let mut terminal = create_test_terminal(MIN_COLUMN_WIDTH * 2, 12);
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let lines = buffer_lines(&terminal);
    assert!(!lines[0].contains(" shop "));
    assert!(lines[0].contains(" orders "));
}

#[test]
fn test_modified_document_is_marked() {
    let store = MemoryStore::from_json_str(FIXTURE).unwrap();
    let mut model = create_test_model(&store);
    model.nav.activate(&store, 0, 0).unwrap();
    model.nav.activate(&store, 1, 0).unwrap();
    model.nav.activate(&store, 2, 1).unwrap();
    let field = model.nav.edit_field_mut(2).unwrap();
    field.delete_back();
    field.insert_str("b\"");
    model.nav.commit_edit(2).unwrap();
    model.focus = 2;

    let mut terminal = create_test_terminal(200, 12);
    terminal.draw(|frame| render(&mut model, frame)).unwrap();
    let lines = buffer_lines(&terminal);
    assert!(lines[0].contains("[modified]"));
    assert!(lines[11].contains("[modified]"));
}

#[test]
fn test_edit_places_cursor_in_field() {
    let store = MemoryStore::from_json_str(FIXTURE).unwrap();
    let mut model = create_test_model(&store);
    model.nav.activate(&store, 0, 0).unwrap();
    model.nav.activate(&store, 1, 0).unwrap();
    model.nav.activate(&store, 2, 1).unwrap();
    model.focus = 2;
    let mut terminal = create_test_terminal(120, 12);
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let text = screen(&terminal);
    assert!(text.contains("[edit]"));
    let cursor = terminal.get_cursor_position().unwrap();
    // Row of `name`, just past `"a"`.
    assert_eq!(cursor.y, 2);
    let row = &buffer_lines(&terminal)[2];
    let name_col = row[..row.find("name: ").unwrap()].chars().count();
    assert_eq!(usize::from(cursor.x), name_col + "name: \"a\"".len());
}

#[test]
fn test_toast_bar_shows_level_prefix() {
    let store = MemoryStore::from_json_str(FIXTURE).unwrap();
    let mut model = create_test_model(&store);
    model.show_toast(ToastLevel::Warning, "careful");
    let mut terminal = create_test_terminal(80, 12);
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let lines = buffer_lines(&terminal);
    assert!(lines[11].starts_with("[warn] careful"));
    assert!(lines[10].contains("fixture.json"));
}

#[test]
fn test_help_overlay_lists_keys_and_config() {
    let store = MemoryStore::from_json_str(FIXTURE).unwrap();
    let mut model = create_test_model(&store);
    model.help_visible = true;
    let mut terminal = create_test_terminal(80, 30);
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let text = screen(&terminal);
    assert!(text.contains("Help"));
    assert!(text.contains("Navigation"));
    assert!(text.contains("Save document"));
    assert!(text.contains("Global: <unknown>"));
}

#[test]
fn test_empty_collection_shows_placeholder() {
    let store = MemoryStore::from_json_str(FIXTURE).unwrap();
    let mut model = create_test_model(&store);
    model.nav.select_next(0).unwrap();
    model.nav.activate(&store, 0, 1).unwrap();
    model.focus = 1;
    let mut terminal = create_test_terminal(80, 12);
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    assert!(screen(&terminal).contains("(empty)"));
}
