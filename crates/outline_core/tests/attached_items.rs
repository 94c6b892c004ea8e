use outline_core::{
    open_db_in_memory, ItemPayload, ItemService, Movement, NodeFields, NodeId, OutlineError,
    OutlineService, Scope, SqliteItemRepository, SqliteOutlineRepository, TreeKind,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

type Items<'conn> = ItemService<SqliteItemRepository<'conn, ItemPayload>, ItemPayload>;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn node(conn: &Connection, kind: TreeKind, title: &str) -> NodeId {
    let service = OutlineService::new(SqliteOutlineRepository::try_new(conn).unwrap());
    service
        .insert(Scope::new(3, kind), None, &NodeFields::new(title), 1)
        .unwrap()
        .node_id
}

fn items(conn: &Connection) -> Items<'_> {
    ItemService::new(SqliteItemRepository::try_new(conn).unwrap())
}

fn faq(question: &str) -> ItemPayload {
    ItemPayload::QuestionAnswer {
        question: question.to_string(),
        answer: format!("answer to {question}"),
    }
}

fn questions(items: &Items<'_>, node_id: NodeId) -> Vec<(i64, String)> {
    items
        .list(node_id, true)
        .unwrap()
        .into_iter()
        .map(|item| match item.payload {
            ItemPayload::QuestionAnswer { question, .. } => (item.index, question),
            other => panic!("unexpected payload: {other:?}"),
        })
        .collect()
}

#[test]
fn create_appends_with_increasing_index() {
    let conn = setup();
    let node_id = node(&conn, TreeKind::Faq, "General");
    let items = items(&conn);

    let first = items.create(node_id, &faq("q1")).unwrap();
    let second = items.create(node_id, &faq("q2")).unwrap();

    assert_eq!(first.index, 1);
    assert_eq!(second.index, 2);
    assert_eq!(first.node_id, node_id);
    assert!(!first.is_hidden);
    assert_eq!(items.get(first.item_id).unwrap().payload, faq("q1"));
}

#[test]
fn create_on_missing_node_is_rejected() {
    let conn = setup();
    let items = items(&conn);
    let missing = uuid::Uuid::new_v4();

    let err = items.create(missing, &faq("q1")).unwrap_err();
    assert!(matches!(err, OutlineError::NodeNotFound(id) if id == missing));
}

#[test]
fn indexes_are_scoped_per_node() {
    let conn = setup();
    let first_node = node(&conn, TreeKind::Faq, "General");
    let second_node = node(&conn, TreeKind::Faq, "Exams");
    let items = items(&conn);

    items.create(first_node, &faq("a")).unwrap();
    items.create(first_node, &faq("b")).unwrap();
    let other = items.create(second_node, &faq("c")).unwrap();

    assert_eq!(other.index, 1);
}

#[test]
fn delete_leaves_gap_and_next_create_uses_max_plus_one() {
    let conn = setup();
    let node_id = node(&conn, TreeKind::Faq, "General");
    let items = items(&conn);
    let a = items.create(node_id, &faq("a")).unwrap();
    let b = items.create(node_id, &faq("b")).unwrap();
    items.create(node_id, &faq("c")).unwrap();

    items.delete(b.item_id).unwrap();
    items.create(node_id, &faq("d")).unwrap();

    assert_eq!(
        questions(&items, node_id),
        [
            (1, "a".to_string()),
            (3, "c".to_string()),
            (4, "d".to_string())
        ]
    );
    assert!(matches!(
        items.delete(b.item_id),
        Err(OutlineError::ItemNotFound(id)) if id == b.item_id
    ));
    items.delete(a.item_id).unwrap();
}

#[test]
fn move_up_and_down_swap_with_neighbours_across_gaps() {
    let conn = setup();
    let node_id = node(&conn, TreeKind::Faq, "General");
    let items = items(&conn);
    let a = items.create(node_id, &faq("a")).unwrap();
    let b = items.create(node_id, &faq("b")).unwrap();
    let c = items.create(node_id, &faq("c")).unwrap();
    items.delete(b.item_id).unwrap();

    items.move_up(c.item_id).unwrap();
    assert_eq!(
        questions(&items, node_id),
        [(1, "c".to_string()), (3, "a".to_string())]
    );

    items.move_down(c.item_id).unwrap();
    assert_eq!(
        questions(&items, node_id),
        [(1, "a".to_string()), (3, "c".to_string())]
    );

    assert_eq!(items.get(a.item_id).unwrap().index, 1);
}

#[test]
fn moves_at_boundaries_are_rejected() {
    let conn = setup();
    let node_id = node(&conn, TreeKind::Faq, "General");
    let items = items(&conn);
    let a = items.create(node_id, &faq("a")).unwrap();
    let b = items.create(node_id, &faq("b")).unwrap();

    assert!(matches!(
        items.move_up(a.item_id),
        Err(OutlineError::MovementNotAllowed {
            movement: Movement::Up,
            ..
        })
    ));
    assert!(matches!(
        items.move_down(b.item_id),
        Err(OutlineError::MovementNotAllowed {
            movement: Movement::Down,
            ..
        })
    ));
    assert!(matches!(
        items.move_up(uuid::Uuid::new_v4()),
        Err(OutlineError::ItemNotFound(_))
    ));
    assert_eq!(
        questions(&items, node_id),
        [(1, "a".to_string()), (2, "b".to_string())]
    );
}

#[test]
fn hidden_items_are_filtered_only_on_request() {
    let conn = setup();
    let node_id = node(&conn, TreeKind::Faq, "General");
    let items = items(&conn);
    let a = items.create(node_id, &faq("a")).unwrap();
    items.create(node_id, &faq("b")).unwrap();

    items.hide(a.item_id).unwrap();
    items.hide(a.item_id).unwrap();
    assert_eq!(items.list(node_id, false).unwrap().len(), 1);
    assert_eq!(items.list(node_id, true).unwrap().len(), 2);
    assert!(items.get(a.item_id).unwrap().is_hidden);

    items.unhide(a.item_id).unwrap();
    assert_eq!(items.list(node_id, false).unwrap().len(), 2);
}

#[test]
fn hidden_items_still_take_part_in_reordering() {
    let conn = setup();
    let node_id = node(&conn, TreeKind::Faq, "General");
    let items = items(&conn);
    let a = items.create(node_id, &faq("a")).unwrap();
    let b = items.create(node_id, &faq("b")).unwrap();
    items.hide(a.item_id).unwrap();

    items.move_up(b.item_id).unwrap();

    assert_eq!(
        questions(&items, node_id),
        [(1, "b".to_string()), (2, "a".to_string())]
    );
}

#[test]
fn update_replaces_payload_without_reordering() {
    let conn = setup();
    let node_id = node(&conn, TreeKind::Bibliography, "Basic");
    let items = items(&conn);
    let reference = ItemPayload::Bibliography {
        authors: "Knuth".to_string(),
        title: "TAOCP".to_string(),
        source: String::new(),
        publisher: "Addison-Wesley".to_string(),
        date: "1968".to_string(),
        identifier: "ISBN 0-201-03801-3".to_string(),
        url: None,
    };
    let item = items.create(node_id, &reference).unwrap();

    let revised = ItemPayload::Bibliography {
        authors: "Donald E. Knuth".to_string(),
        title: "The Art of Computer Programming".to_string(),
        source: String::new(),
        publisher: "Addison-Wesley".to_string(),
        date: "1968".to_string(),
        identifier: "ISBN 0-201-03801-3".to_string(),
        url: Some("https://example.org/taocp".to_string()),
    };
    let updated = items.update(item.item_id, &revised).unwrap();

    assert_eq!(updated.payload, revised);
    assert_eq!(updated.index, item.index);
    assert!(matches!(
        items.update(uuid::Uuid::new_v4(), &revised),
        Err(OutlineError::ItemNotFound(_))
    ));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slide {
    number: u32,
    caption: String,
}

#[test]
fn storage_is_generic_over_payload_type() {
    let conn = setup();
    let node_id = node(&conn, TreeKind::Information, "Slides");
    let slides: ItemService<SqliteItemRepository<'_, Slide>, Slide> =
        ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());

    let slide = Slide {
        number: 1,
        caption: "Welcome".to_string(),
    };
    let created = slides.create(node_id, &slide).unwrap();

    assert_eq!(slides.get(created.item_id).unwrap().payload, slide);
}
