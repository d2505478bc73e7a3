//! Small end-to-end walkthrough: a name -> person map hashed with FNV-1a.
//!
//! Run with `cargo run --example people`.

use chained_hashmap::fnv::BuildFnv1a32;
use chained_hashmap::{ChainedHashMap, ChainedHashMapBuilder, SetError, Visit};

#[derive(Debug)]
struct Person {
    age: u32,
    height: f32,
}

type People = ChainedHashMap<String, Person, BuildFnv1a32>;

fn add_user(map: &mut People, name: &str, age: u32, height: f32) -> Result<(), SetError<String, Person>> {
    map.set(name.to_string(), Person { age, height })?;
    Ok(())
}

fn print_user(name: &str, person: &Person) {
    println!("{} is {} and {} tall", name, person.age, person.height);
}

fn show_user(map: &People, name: &str) -> bool {
    match map.get(name) {
        Some(entry) => {
            print_user(entry.key(), entry.value());
            true
        }
        None => {
            println!("{name} does not exist");
            false
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut map: People = ChainedHashMapBuilder::new().hasher(BuildFnv1a32).build()?;

    add_user(&mut map, "Alice", 25, 1.75)?;
    add_user(&mut map, "Bob", 30, 1.80)?;

    println!("All Users:");
    map.for_each(|name, person| {
        print_user(name, person);
        Visit::CONTINUE
    });
    println!();

    for name in ["Alice", "Bob", "Charlie"] {
        show_user(&map, name);
    }

    println!("Removing Alice");
    map.remove("Alice");

    for name in ["Alice", "Bob", "Charlie"] {
        show_user(&map, name);
    }

    map.destroy();
    Ok(())
}
