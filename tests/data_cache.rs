use repeat_dom::{data_cache::{self, DataCache}, Value};

#[test]
fn entries_without_raw_text_are_never_cached() {
	let mut cache = DataCache::new();
	cache.set(1, None, Value::from(1));
	assert_eq!(cache.get(1, None), None);
	assert!(cache.is_clean());
}

#[test]
fn entries_are_keyed_by_scope_and_text() {
	let mut cache = DataCache::new();
	cache.set(1, Some("a.b"), Value::from(1));
	cache.set(2, Some("a.b"), Value::from(2));
	assert_eq!(cache.get(1, Some("a.b")), Some(Value::from(1)));
	assert_eq!(cache.get(2, Some("a.b")), Some(Value::from(2)));
	assert_eq!(cache.get(1, Some("a.c")), None);
	assert_eq!(cache.get(3, Some("a.b")), None);
}

#[test]
fn clear_wipes_only_when_dirty() {
	let mut cache = DataCache::new();
	assert!(cache.is_clean());
	cache.clear();
	assert!(cache.is_clean());

	cache.set(1, Some("x"), Value::from(true));
	assert!(!cache.is_clean());
	cache.clear();
	assert!(cache.is_clean());
	assert_eq!(cache.get(1, Some("x")), None);
}

#[test]
fn thread_cache_evaluates_once_per_clear() {
	data_cache::init();
	let mut evaluations = 0;
	let mut evaluate = || {
		data_cache::get_or_insert_with(7, Some("list"), || {
			evaluations += 1;
			Value::from(evaluations)
		})
	};
	assert_eq!(evaluate(), Value::from(1));
	assert_eq!(evaluate(), Value::from(1));
	drop(evaluate);
	assert_eq!(evaluations, 1);

	data_cache::clear();
	assert!(data_cache::is_clean());
	assert_eq!(data_cache::get(7, Some("list")), None);
}
