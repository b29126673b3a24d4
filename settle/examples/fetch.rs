use std::collections::BTreeMap;

use futures::executor::block_on;
use settle::{invoke, invoke_async, named, throw, Error, Settled};

#[derive(Debug, thiserror::Error)]
#[error("no user with id {0}")]
struct NotFound(u32);

async fn fetch_user(id: u32) -> Result<String, Error> {
    match id {
        1 => Ok(String::from("ada")),
        2 => throw(serde_json::json!({ "status": 503, "retry": true })),
        _ => Err(Error::new(NotFound(id))),
    }
}

fn report<T: std::fmt::Debug>(label: &str, settled: Settled<T>) {
    match settled.into_pair() {
        (None, Some(value)) => println!("{label}: ok {value:?}"),
        (Some(err), _) => match err.as_unknown() {
            Some(unknown) => println!(
                "{label}: {} threw {} with {:?}",
                unknown.function(),
                unknown.thrown(),
                unknown.arguments()
            ),
            None => println!("{label}: error {err}"),
        },
        (None, None) => unreachable!(),
    }
}

fn main() {
    for id in 1..=3 {
        report(&format!("user {id}"), block_on(invoke_async(fetch_user, (id,))));
    }

    let totals = invoke(
        named("tally", |words: Vec<String>| {
            let mut totals = BTreeMap::new();
            for word in words {
                *totals.entry(word).or_insert(0u32) += 1;
            }
            totals
        }),
        (vec![String::from("a"), String::from("b"), String::from("a")],),
    );
    report("tally", totals);

    let parsed = invoke(
        |input: &str| -> u8 { input.parse().unwrap_or_else(|_| throw(input.to_owned())) },
        ("x",),
    );
    report("parse", parsed);
}
