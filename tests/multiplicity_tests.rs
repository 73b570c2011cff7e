//! Counted generation tests.
//!
//! An integer override for a generator key asks for that many independent
//! invocations of the generator, collected in invocation order.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use helpers::models::{self, User};
use kin::{Blueprint, Concurrency, Generator, Kin, KinError, KinSettings, ModelConstructor, Overrides};
use rstest::rstest;
use serde_json::{Value, json};

fn kin_with(concurrency: Concurrency) -> Kin {
	Kin::builder()
		.with_settings(KinSettings::new().with_concurrency(concurrency))
		.build()
}

#[rstest]
#[tokio::test]
async fn test_count_override_yields_sequence_of_words() {
	// Arrange
	let kin = Kin::new();
	kin.define("Post", Blueprint::new().with_generator("tags", models::word()));

	// Act
	let generated = kin
		.generate("Post", Overrides::new().with_count("tags", 5))
		.await
		.unwrap();

	// Assert
	let tags = generated.model.get("tags").unwrap();
	let tags = tags.as_array().unwrap();
	assert_eq!(tags.len(), 5);
	assert!(tags.iter().all(Value::is_string));
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(7)]
#[tokio::test]
async fn test_count_invokes_generator_exactly_n_times(#[case] count: usize) {
	// Arrange
	let calls = Arc::new(AtomicUsize::new(0));
	let kin = Kin::new();
	kin.define("Post", Blueprint::new().with_generator("views", models::counter(&calls)));

	// Act
	let generated = kin
		.generate("Post", Overrides::new().with_count("views", count))
		.await
		.unwrap();

	// Assert
	let expected: Vec<Value> = (1..=count).map(|n| json!(n)).collect();
	assert_eq!(generated.model.get("views"), Some(Value::Array(expected)));
	assert_eq!(calls.load(Ordering::SeqCst), count);
}

#[rstest]
#[tokio::test]
async fn test_count_on_literal_key_is_plain_override() {
	// Arrange
	let kin = Kin::new();
	kin.define("Post", Blueprint::new().with_value("views", 100));

	// Act
	let generated = kin
		.generate("Post", Overrides::new().with_count("views", 3))
		.await
		.unwrap();

	// Assert
	assert_eq!(generated.model.get("views"), Some(json!(3)));
}

#[rstest]
#[tokio::test]
async fn test_count_for_undeclared_key_passes_through() {
	// Arrange
	let kin = Kin::new();
	kin.define("Post", Blueprint::new().with_value("title", "Hello"));

	// Act
	let generated = kin
		.generate("Post", Overrides::new().with_count("likes", 4))
		.await
		.unwrap();

	// Assert
	assert_eq!(generated.model.get("likes"), Some(json!(4)));
}

#[rstest]
#[tokio::test]
async fn test_counted_invocations_can_read_siblings() {
	// Arrange
	let kin = Kin::new();
	kin.define(
		"Post",
		Blueprint::new()
			.with_value("title", "Hello")
			.with_generator(
				"slugs",
				Generator::new(|ctx| async move {
					let title: String = ctx.resolve_as("title").await?;
					Ok(json!(title.to_lowercase()))
				}),
			),
	);

	// Act
	let generated = kin
		.generate("Post", Overrides::new().with_count("slugs", 2))
		.await
		.unwrap();

	// Assert
	assert_eq!(generated.model.get("slugs"), Some(json!(["hello", "hello"])));
}

#[rstest]
#[tokio::test]
async fn test_counted_model_field() {
	// Arrange
	let kin = Kin::new();
	kin.define(
		"User",
		Blueprint::new()
			.with_model(ModelConstructor::of::<User>())
			.with_value("username", "joe")
			.with_value("email", "joe@example.com")
			.with_generator("tags", models::word()),
	);

	// Act
	let user: User = kin
		.generate("User", Overrides::new().with_count("tags", 3))
		.await
		.unwrap()
		.into_model()
		.unwrap();

	// Assert
	assert_eq!(user.tags.len(), 3);
}

#[rstest]
#[tokio::test]
async fn test_random_count_within_bounds() {
	// Arrange
	let kin = Kin::new();
	kin.define("Post", Blueprint::new().with_generator("tags", models::word()));

	// Act
	let generated = kin
		.generate("Post", Overrides::new().with_count_between("tags", 2, 4))
		.await
		.unwrap();

	// Assert
	let len = generated.model.get("tags").unwrap().as_array().unwrap().len();
	assert!((2..=4).contains(&len));
}

#[rstest]
#[case(Concurrency::Sequential)]
#[case(Concurrency::Concurrent)]
#[tokio::test]
async fn test_one_failing_invocation_fails_batch(#[case] concurrency: Concurrency) {
	// Arrange
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	let kin = kin_with(concurrency);
	kin.define(
		"Post",
		Blueprint::new().with_generator(
			"tags",
			Generator::from_fn(move |_| {
				if counter.fetch_add(1, Ordering::SeqCst) == 2 {
					Err(KinError::generator("third tag failed"))
				} else {
					Ok(json!("tag"))
				}
			}),
		),
	);
	let handle = kin.make_generator("Post", Overrides::new());

	// Act
	let result = handle.generate_with(Overrides::new().with_count("tags", 5)).await;

	// Assert
	assert_eq!(result.unwrap_err().to_string(), "third tag failed");
	assert_eq!(handle.item_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_concurrent_batch_keeps_invocation_order() {
	// Arrange
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	let kin = kin_with(Concurrency::Concurrent);
	kin.define(
		"Post",
		Blueprint::new().with_generator(
			"ranks",
			Generator::new(move |_| {
				let index = counter.fetch_add(1, Ordering::SeqCst) as u64;
				async move {
					// Earlier invocations complete later
					tokio::time::sleep(Duration::from_millis(40 - index * 10)).await;
					Ok(json!(index))
				}
			}),
		),
	);

	// Act
	let generated = kin
		.generate("Post", Overrides::new().with_count("ranks", 4))
		.await
		.unwrap();

	// Assert
	assert_eq!(generated.model.get("ranks"), Some(json!([0, 1, 2, 3])));
}

#[rstest]
#[tokio::test]
async fn test_counts_expand_in_declaration_order() {
	// Arrange
	let calls = Arc::new(AtomicUsize::new(0));
	let kin = Kin::new();
	kin.define(
		"Post",
		Blueprint::new()
			.with_generator("first", models::counter(&calls))
			.with_generator("second", models::counter(&calls)),
	);

	// Act
	let generated = kin
		.generate(
			"Post",
			Overrides::new().with_count("second", 2).with_count("first", 2),
		)
		.await
		.unwrap();

	// Assert
	assert_eq!(generated.model.get("first"), Some(json!([1, 2])));
	assert_eq!(generated.model.get("second"), Some(json!([3, 4])));
}
