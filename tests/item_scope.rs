use repeat_dom::{
	change::{ChangeKind, ChangeOption},
	data::DataScope,
	data_cache, Data, ForDirective, ItemKey, ItemScope, Path, Value,
};
use std::rc::Rc;

fn path(text: &str) -> Path {
	Path::parse(text).unwrap()
}

fn record(name: &str) -> Value {
	Value::map(vec![("name", Value::from(name)), ("tags", Value::list(vec!["t".into()]))])
}

fn setup(directive: ForDirective, index: usize) -> (Rc<Data>, ItemScope) {
	let data = Rc::new(Data::new(Value::map(vec![
		("list", Value::list(vec![record("a"), record("b"), record("c")])),
		("selected", Value::from(0)),
	])));
	let item = data.get(&path("list").child(repeat_dom::Segment::Index(index)));
	let scope = ItemScope::new(Rc::clone(&data) as Rc<dyn DataScope>, Rc::new(directive), item, ItemKey::Index(index));
	(data, scope)
}

#[test]
fn reads_item_and_index_locally() {
	let (_data, scope) = setup(ForDirective::new("item", path("list")).with_index("i"), 2);
	assert_eq!(scope.get(&path("item.name")), Value::from("c"));
	assert_eq!(scope.get(&path("i")), Value::from(2));
	assert_eq!(scope.get(&path("selected")), Value::from(0));
	assert_eq!(scope.get(&path("$index")), Value::Null);
}

#[test]
fn default_index_name() {
	let (_data, scope) = setup(ForDirective::new("item", path("list")), 1);
	assert_eq!(scope.get(&path("$index")), Value::from(1));
}

#[test]
fn translates_item_paths_onto_the_collection() {
	let (_data, scope) = setup(ForDirective::new("item", path("list")).with_index("i"), 1);
	assert_eq!(scope.translate(&path("item")).to_string(), "list[1]");
	assert_eq!(scope.translate(&path("item.tags[0]")).to_string(), "list[1].tags[0]");
	assert_eq!(scope.translate(&path("selected")).to_string(), "selected");
	assert_eq!(scope.translate(&path("other[i]")).to_string(), "other[1]");
	assert_eq!(scope.translate(&path("other[item.name]")).to_string(), "other[list[1].name]");
}

#[test]
fn mutations_are_forwarded_to_the_parent() {
	let (data, scope) = setup(ForDirective::new("item", path("list")), 1);

	scope.set(&path("item.name"), "B".into(), ChangeOption::default());
	assert_eq!(data.get(&path("list[1].name")), Value::from("B"));
	assert_eq!(scope.get(&path("item.name")), Value::from("b"), "local item only changes through the region");

	scope.push(&path("item.tags"), "u".into(), ChangeOption::default());
	scope.pop(&path("item.tags"), ChangeOption::default());
	scope.unshift(&path("item.tags"), "s".into(), ChangeOption::default());
	scope.shift(&path("item.tags"), ChangeOption::default());
	scope.remove(&path("item.tags"), &Value::from("t"), ChangeOption::default());
	scope.splice(&path("item.tags"), 0, 0, vec!["v".into()], ChangeOption::default());
	assert_eq!(data.get(&path("list[1].tags")), Value::list(vec!["v".into()]));

	let changes = data.take_changes();
	assert_eq!(changes.len(), 7);
	assert_eq!(changes[0].path.to_string(), "list[1].name");
	assert!(changes[1..].iter().all(|change| change.path.to_string() == "list[1].tags" && change.is_splice()));
	match &changes[6].kind {
		ChangeKind::Splice { index, delete_count, insertions } => {
			assert_eq!((*index, *delete_count), (0, 0));
			assert_eq!(insertions, &vec![Value::from("v")]);
		}
		ChangeKind::Set { .. } => panic!("expected splice"),
	}
}

#[test]
fn silent_mutations_are_not_recorded() {
	let (data, scope) = setup(ForDirective::new("item", path("list")), 0);
	scope.set(&path("item.name"), "A".into(), ChangeOption::SILENT);
	assert_eq!(data.get(&path("list[0].name")), Value::from("A"));
	assert_eq!(data.pending_change_count(), 0);
}

#[test]
fn mutations_invalidate_the_data_cache() {
	data_cache::init();
	let (_data, scope) = setup(ForDirective::new("item", path("list")), 0);

	data_cache::set(scope.id(), Some("item.name"), Value::from("a"));
	assert_eq!(data_cache::get(scope.id(), Some("item.name")), Some(Value::from("a")));
	assert!(!data_cache::is_clean());

	scope.set(&path("item.name"), "z".into(), ChangeOption::default());
	assert_eq!(data_cache::get(scope.id(), Some("item.name")), None);
	assert!(data_cache::is_clean());
}

#[test]
fn each_scope_has_its_own_identity() {
	let (_data, a) = setup(ForDirective::new("item", path("list")), 0);
	let (_data, b) = setup(ForDirective::new("item", path("list")), 0);
	assert_ne!(a.id(), b.id());
	assert_eq!(a.index(), ItemKey::Index(0));
	assert_eq!(a.item(), b.item());
	assert_eq!(a.directive().item(), "item");
	assert_eq!(a.directive().index_name(), "$index");
}
