use std::any::Any;
use std::sync::{Arc, Mutex};

use bindwork_common::{
    ALL_EVENTS, AttributeModel, Collection, Events, Listener, ListenerToken, Model, ModelEvent,
    ModelRef, downcast_model, same_model,
};
use serde_json::{Value as JsonValue, json};

// A hand-written model type: a counter that emits `increment`
#[derive(Default)]
struct Counter {
    value: Mutex<i64>,
    events: Events,
}

impl Counter {
    fn increment(&self) {
        let value = {
            let mut value = self.value.lock().unwrap();
            *value += 1;
            *value
        };
        self.events
            .trigger(&ModelEvent::with_payload("increment", json!(value)));
    }
}

impl Model for Counter {
    fn on(&self, event: &str, listener: Listener) -> ListenerToken {
        self.events.on(event, listener)
    }

    fn off(&self, token: ListenerToken) -> bool {
        self.events.off(token)
    }

    fn snapshot(&self) -> JsonValue {
        json!({ "value": *self.value.lock().unwrap() })
    }

    fn kinds(&self) -> Vec<String> {
        vec!["Counter".to_string()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn log_all(model: &dyn Model) -> Arc<Mutex<Vec<(String, JsonValue)>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    model.on(
        ALL_EVENTS,
        Arc::new(move |event: &ModelEvent| {
            sink.lock()
                .unwrap()
                .push((event.name.clone(), event.payload.clone()));
        }),
    );
    log
}

#[test]
fn test_custom_model_through_trait_object() {
    let counter = Arc::new(Counter::default());
    let model: ModelRef = counter.clone();
    let log = log_all(&*model);

    counter.increment();
    counter.increment();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("increment".to_string(), json!(1)),
            ("increment".to_string(), json!(2)),
        ]
    );
    assert_eq!(model.snapshot(), json!({ "value": 2 }));
    assert!(model.is_a("Counter"));
    assert!(downcast_model::<Counter>(&model).is_some());
}

#[test]
fn test_collection_of_mixed_models_forwards_member_events() {
    let counter = Arc::new(Counter::default());
    let user = Arc::new(AttributeModel::from_json(json!({ "name": "Harry" })));
    let collection = Collection::new();
    let log = log_all(&collection);

    collection.add(counter.clone());
    collection.add(user.clone());
    counter.increment();
    user.set("name", json!("Robert"));

    let names: Vec<String> = log.lock().unwrap().iter().map(|(name, _)| name.clone()).collect();
    assert_eq!(
        names,
        vec!["add", "update", "add", "update", "increment", "change:name", "change"]
    );
    assert_eq!(
        collection.snapshot(),
        json!([{ "value": 1 }, { "name": "Robert" }])
    );
}

#[test]
fn test_payloads_carry_new_values() {
    let user = AttributeModel::from_json(json!({ "name": "Harry", "age": 25 }));
    let log = log_all(&user);

    user.set("age", json!(26));
    user.unset("name");

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("change:age".to_string(), json!(26)),
            ("change".to_string(), json!(["age"])),
            ("change:name".to_string(), JsonValue::Null),
            ("change".to_string(), json!(["name"])),
        ]
    );
}

#[test]
fn test_identity_survives_clones_and_collections() {
    let user: ModelRef = Arc::new(AttributeModel::new());
    let collection = Collection::from_models([user.clone()]);

    let member = collection.get(0).unwrap();
    assert!(same_model(&member, &user));
    assert!(!same_model(&member, &(Arc::new(AttributeModel::new()) as ModelRef)));
}
