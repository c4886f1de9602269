// EntityAdapter scenario suite over a typed record.
//
// Each test documents the behavior being verified. The core invariants
// exercised:
// - Bijection: ids and entities always describe the same key set.
// - Identity on no-op: re-adding, or updating/removing a missing id,
//   returns the input state (pointer-equal).
// - Order: inserts append in input order; renames relabel in place;
//   set_all replaces order wholesale.
// - Batches: update_many resolves later descriptors against earlier
//   renames in the same batch.
use entity_adapter::{Entity, EntityAdapter, EntityState, Update};
use indexmap::IndexMap;

#[derive(Clone, Debug, PartialEq)]
struct Book {
    id: String,
    title: String,
    author: Option<String>,
}

#[derive(Clone, Debug, Default)]
struct BookChanges {
    id: Option<String>,
    title: Option<String>,
    author: Option<String>,
}

impl Entity for Book {
    type Changes = BookChanges;

    fn apply(&mut self, changes: BookChanges) {
        if let Some(id) = changes.id {
            self.id = id;
        }
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(author) = changes.author {
            self.author = Some(author);
        }
    }
}

fn book(id: &str, title: &str) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: None,
    }
}

fn the_great_gatsby() -> Book {
    book("tgg", "The Great Gatsby")
}
fn a_clockwork_orange() -> Book {
    book("aco", "A Clockwork Orange")
}
fn animal_farm() -> Book {
    book("af", "Animal Farm")
}
fn the_hobbit() -> Book {
    book("th", "The Hobbit")
}

fn title(t: &str) -> BookChanges {
    BookChanges {
        title: Some(t.to_string()),
        ..Default::default()
    }
}

fn rename(to: &str) -> BookChanges {
    BookChanges {
        id: Some(to.to_string()),
        ..Default::default()
    }
}

type Books = EntityAdapter<Book, String, fn(&Book) -> String>;

fn adapter() -> Books {
    fn select_id(b: &Book) -> String {
        b.id.clone()
    }
    EntityAdapter::new(select_id as fn(&Book) -> String)
}

fn empty() -> EntityState<String, Book> {
    EntityState::new()
}

fn ids(state: &EntityState<String, Book>) -> Vec<&str> {
    state.ids().iter().map(String::as_str).collect()
}

fn keyed(books: Vec<Book>) -> IndexMap<String, Book> {
    books.into_iter().map(|b| (b.id.clone(), b)).collect()
}

// Test: addOne on an empty state.
// Verifies: the id is appended and the record stored verbatim.
#[test]
fn add_one_entity() {
    let a = adapter();
    let with_one = a.add_one(&empty(), the_great_gatsby());
    assert_eq!(ids(&with_one), vec!["tgg"]);
    assert_eq!(with_one.get("tgg"), Some(&the_great_gatsby()));
    assert!(with_one.indices().is_empty());
    assert_eq!(a.validate(&with_one), Ok(()));
}

// Test: re-adding an existing id.
// Verifies: the returned state is the input, not a copy.
#[test]
fn re_add_is_identity() {
    let a = adapter();
    let with_one = a.add_one(&empty(), the_great_gatsby());
    let readded = a.add_one(&with_one, book("tgg", "Something Else"));
    assert!(readded.ptr_eq(&with_one));
    assert_eq!(readded.get("tgg").map(|b| b.title.as_str()), Some("The Great Gatsby"));
}

// Test: addMany from a list and from a keyed map.
// Verifies: new ids append in input order; both inputs agree.
#[test]
fn add_many_from_list_and_map() {
    let a = adapter();
    let with_one = a.add_one(&empty(), the_great_gatsby());

    let from_list = a.add_many(&with_one, vec![a_clockwork_orange(), animal_farm()]);
    assert_eq!(ids(&from_list), vec!["tgg", "aco", "af"]);

    let from_map = a.add_many(&with_one, keyed(vec![a_clockwork_orange(), animal_farm()]));
    assert_eq!(from_list, from_map);
    assert_eq!(from_map.get("af"), Some(&animal_farm()));
}

// Test: addMany leaves existing records alone.
#[test]
fn add_many_does_not_overwrite() {
    let a = adapter();
    let s = a.add_one(&empty(), the_great_gatsby());
    let s = a.add_many(&s, vec![book("tgg", "Overwritten?"), animal_farm()]);
    assert_eq!(ids(&s), vec!["tgg", "af"]);
    assert_eq!(s.get("tgg"), Some(&the_great_gatsby()));
}

// Test: setAll from a list and from a keyed map.
// Verifies: prior contents are discarded; order follows input.
#[test]
fn set_all_replaces_everything() {
    let a = adapter();
    let with_one = a.add_one(&empty(), the_great_gatsby());

    let with_all = a.set_all(&with_one, vec![a_clockwork_orange(), animal_farm()]);
    assert_eq!(ids(&with_all), vec!["aco", "af"]);
    assert!(!with_all.contains_key("tgg"));

    let from_map = a.set_all(&with_one, keyed(vec![a_clockwork_orange(), animal_farm()]));
    assert_eq!(with_all, from_map);
}

// Test: set_all and remove_all carry the reserved indices forward.
#[test]
fn indices_survive_wholesale_replacement() {
    let a = adapter();
    let mut s = a.add_one(&empty(), the_great_gatsby());
    s.indices_mut()
        .insert("by_author".to_string(), vec!["tgg".to_string()]);

    let replaced = a.set_all(&s, vec![animal_farm()]);
    assert_eq!(replaced.indices(), s.indices());
    let cleared = a.remove_all(&replaced);
    assert_eq!(cleared.indices(), s.indices());
}

// Test: removeOne.
#[test]
fn remove_one_entity() {
    let a = adapter();
    let with_one = a.add_one(&empty(), the_great_gatsby());
    let without = a.remove_one(&with_one, "tgg");
    assert!(without.is_empty());
    assert_eq!(without, empty());
    assert!(a.remove_one(&without, "tgg").ptr_eq(&without));
}

// Test: removeMany.
// Verifies: listed ids go, order of the rest is kept.
#[test]
fn remove_many_entities() {
    let a = adapter();
    let with_all = a.set_all(
        &empty(),
        vec![the_great_gatsby(), a_clockwork_orange(), animal_farm()],
    );
    let without = a.remove_many(&with_all, vec!["tgg".to_string(), "aco".to_string()]);
    assert_eq!(ids(&without), vec!["af"]);
    assert_eq!(without.get("af"), Some(&animal_farm()));
}

// Test: removeAll.
#[test]
fn remove_all_entities() {
    let a = adapter();
    let with_all = a.set_all(
        &empty(),
        vec![the_great_gatsby(), a_clockwork_orange(), animal_farm()],
    );
    let without = a.remove_all(&with_all);
    assert!(without.ids().is_empty());
    assert_eq!(without, empty());
}

// Test: updateOne without a rename.
// Verifies: the record merges the changes; ids is shared with the input.
#[test]
fn update_one_entity() {
    let a = adapter();
    let with_one = a.add_one(&empty(), the_great_gatsby());
    let updated = a.update_one(&with_one, Update::new("tgg".to_string(), title("A New Hope")));
    assert_eq!(updated.get("tgg"), Some(&book("tgg", "A New Hope")));
    assert!(updated.shares_ids(&with_one));
    assert_eq!(with_one.get("tgg"), Some(&the_great_gatsby()));
}

// Test: updateOne on a missing id.
#[test]
fn update_missing_is_identity() {
    let a = adapter();
    let s = empty();
    let updated = a.update_one(&s, Update::new("tgg".to_string(), title("A New Title")));
    assert!(updated.ptr_eq(&s));
}

// Test: updateOne that changes the id.
// Verifies: old key gone, new key present, position kept.
#[test]
fn update_one_renames_in_place() {
    let a = adapter();
    let s = a.set_all(
        &empty(),
        vec![the_great_gatsby(), a_clockwork_orange(), animal_farm()],
    );
    let renamed = a.update_one(&s, Update::new("aco".to_string(), rename("A New Id")));
    assert_eq!(ids(&renamed), vec!["tgg", "A New Id", "af"]);
    assert!(!renamed.contains_key("aco"));
    assert_eq!(
        renamed.get("A New Id"),
        Some(&book("A New Id", "A Clockwork Orange"))
    );
    assert_eq!(a.validate(&renamed), Ok(()));
}

// Test: updateMany over distinct ids.
#[test]
fn update_many_entities() {
    let a = adapter();
    let s = a.set_all(&empty(), vec![the_great_gatsby(), a_clockwork_orange()]);
    let updated = a.update_many(
        &s,
        vec![
            Update::new("tgg".to_string(), title("First Change")),
            Update::new("aco".to_string(), title("Second Change")),
        ],
    );
    assert_eq!(ids(&updated), vec!["tgg", "aco"]);
    assert_eq!(updated.get("tgg"), Some(&book("tgg", "First Change")));
    assert_eq!(updated.get("aco"), Some(&book("aco", "Second Change")));
}

// Test: updateMany where the same id is renamed twice.
// Verifies: exactly one record survives under the final key, carrying the
// original fields; neither intermediate key remains.
#[test]
fn repeated_rename_in_one_batch() {
    let a = adapter();
    let with_a = a.add_one(&empty(), book("a", "First"));
    let updated = a.update_many(
        &with_a,
        vec![
            Update::new("a".to_string(), rename("b")),
            Update::new("a".to_string(), rename("c")),
        ],
    );
    assert_eq!(updated.len(), 1);
    assert_eq!(ids(&updated), vec!["c"]);
    assert!(updated.get("a").is_none());
    assert!(updated.get("b").is_none());
    assert_eq!(updated.get("c"), Some(&book("c", "First")));
    assert_eq!(a.validate(&updated), Ok(()));
}

// Test: a rename chain addressed by intermediate keys.
// Verifies: a -> b then b -> c works the same as addressing a twice.
#[test]
fn rename_chain_by_current_key() {
    let a = adapter();
    let s = a.set_all(&empty(), vec![book("x", "X"), book("a", "A"), book("y", "Y")]);
    let updated = a.update_many(
        &s,
        vec![
            Update::new("a".to_string(), rename("b")),
            Update::new("b".to_string(), rename("c")),
        ],
    );
    assert_eq!(ids(&updated), vec!["x", "c", "y"]);
    assert_eq!(updated.get("c"), Some(&book("c", "A")));
}

// Test: updateMany with a rename followed by a field change on the old id.
#[test]
fn later_descriptor_follows_rename() {
    let a = adapter();
    let s = a.add_one(&empty(), the_hobbit());
    let updated = a.update_many(
        &s,
        vec![
            Update::new("th".to_string(), rename("hobbit")),
            Update::new(
                "th".to_string(),
                BookChanges {
                    author: Some("Tolkien".to_string()),
                    ..Default::default()
                },
            ),
        ],
    );
    assert_eq!(ids(&updated), vec!["hobbit"]);
    assert_eq!(
        updated.get("hobbit").and_then(|b| b.author.as_deref()),
        Some("Tolkien")
    );
}

// Test: upsertOne inserts when absent and merges when present.
#[test]
fn upsert_one_inserts_then_updates() {
    let a = adapter();
    let inserted = a.upsert_one(&empty(), the_great_gatsby());
    assert_eq!(ids(&inserted), vec!["tgg"]);

    let updated = a.upsert_one(&inserted, book("tgg", "A New Hope"));
    assert_eq!(ids(&updated), vec!["tgg"]);
    assert_eq!(updated.get("tgg"), Some(&book("tgg", "A New Hope")));
    assert!(updated.shares_ids(&inserted));
}

// Test: upsertMany from a list and from a keyed map.
// Verifies: existing records merge, new ones append in input order.
#[test]
fn upsert_many_from_list_and_map() {
    let a = adapter();
    let s = a.set_all(&empty(), vec![the_great_gatsby()]);

    let from_list = a.upsert_many(&s, vec![book("tgg", "First Change"), a_clockwork_orange()]);
    assert_eq!(ids(&from_list), vec!["tgg", "aco"]);
    assert_eq!(from_list.get("tgg"), Some(&book("tgg", "First Change")));
    assert_eq!(from_list.get("aco"), Some(&a_clockwork_orange()));

    let from_map = a.upsert_many(&s, keyed(vec![book("tgg", "First Change"), a_clockwork_orange()]));
    assert_eq!(from_list, from_map);
}

// Test: setOne/setMany replace without merging.
#[test]
fn set_one_and_set_many_replace() {
    let a = adapter();
    let mut authored = the_great_gatsby();
    authored.author = Some("Fitzgerald".to_string());
    let s = a.add_many(&empty(), vec![authored, animal_farm()]);

    let s = a.set_one(&s, the_great_gatsby());
    assert_eq!(s.get("tgg"), Some(&the_great_gatsby()));

    let s = a.set_many(&s, vec![book("af", "Animal Farm II"), the_hobbit()]);
    assert_eq!(ids(&s), vec!["tgg", "af", "th"]);
    assert_eq!(s.get("af"), Some(&book("af", "Animal Farm II")));
}

// Test: iteration follows ids.
#[test]
fn iter_in_id_order() {
    let a = adapter();
    let s = a.initial_state_with(vec![animal_farm(), the_great_gatsby(), the_hobbit()]);
    let titles: Vec<_> = s.iter().map(|(_, b)| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Animal Farm", "The Great Gatsby", "The Hobbit"]);
}
