use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use ts_rs::TS;

pub const CATEGORY_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Category {
    Boy,
    Girl,
    Animal,
    Plant,
    Thing,
    Country,
    Food,
    Profession,
}

impl Category {
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::Boy,
        Category::Girl,
        Category::Animal,
        Category::Plant,
        Category::Thing,
        Category::Country,
        Category::Food,
        Category::Profession,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Boy => "boy",
            Category::Girl => "girl",
            Category::Animal => "animal",
            Category::Plant => "plant",
            Category::Thing => "thing",
            Category::Country => "country",
            Category::Food => "food",
            Category::Profession => "profession",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Boy => "Boy Name",
            Category::Girl => "Girl Name",
            Category::Animal => "Animal",
            Category::Plant => "Plant/Fruit",
            Category::Thing => "Thing/Object",
            Category::Country => "Country/City",
            Category::Food => "Food",
            Category::Profession => "Profession",
        }
    }

    fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A player's self-reported judgment on one of their own answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CorrectionMark {
    #[default]
    Unset,
    Correct,
    Wrong,
}

impl CorrectionMark {
    /// unset -> correct -> wrong -> unset
    pub fn next(self) -> Self {
        match self {
            CorrectionMark::Unset => CorrectionMark::Correct,
            CorrectionMark::Correct => CorrectionMark::Wrong,
            CorrectionMark::Wrong => CorrectionMark::Unset,
        }
    }
}

/// One value per category. The key set is fixed, so every category is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap<T> {
    entries: [T; CATEGORY_COUNT],
}

impl<T> CategoryMap<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().zip(self.entries.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T> Index<Category> for CategoryMap<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        &self.entries[category.position()]
    }
}

impl<T> IndexMut<Category> for CategoryMap<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        &mut self.entries[category.position()]
    }
}

pub type Answers = CategoryMap<String>;
pub type Corrections = CategoryMap<CorrectionMark>;
