/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Cosmetic text for the table: who sits down, what they think about, what they eat.

use rand::seq::{IndexedRandom, SliceRandom};

const NAMES: &[&str] = &[
    "Ted Wendt",
    "Guz",
    "Socrates",
    "Plato",
    "Aristotle",
    "Descartes",
    "Nate Williams",
    "Molly",
    "Shaun Scott",
];

const THOUGHTS: &[&str] = &[
    "magnetic tape",
    "the meaning of life",
    "how to pick up chopsticks faster",
    "what's for dinner",
    "ethics of eating",
    "how to avoid starvation",
    "fluffy pink bunny slippers",
];

// Repeats weight the draw.
const FOODS: &[&str] = &[
    "Tammy's pizza",
    "hamburger",
    "flavorless chicken",
    "fries",
    "bagel",
    "rice and corn",
    "rice and corn",
    "rice and corn",
];

/// A shuffled roster of `count` names. Seats beyond the stock names are
/// called "Philosopher N".
#[must_use]
pub fn roster(count: usize) -> Vec<String> {
    let mut names: Vec<String> = NAMES.iter().map(|name| (*name).to_string()).collect();
    names.shuffle(&mut rand::rng());
    names.truncate(count);
    for seat in names.len()..count {
        names.push(format!("Philosopher {}", seat + 1));
    }
    names
}

/// Something to think about.
#[must_use]
pub fn thought() -> &'static str {
    THOUGHTS.choose(&mut rand::rng()).copied().unwrap_or("nothing at all")
}

/// Something to eat.
#[must_use]
pub fn food() -> &'static str {
    FOODS.choose(&mut rand::rng()).copied().unwrap_or("rice and corn")
}
