//! Static keyword membership sets for hashtag classification.
//!
//! The five sets are disjoint: a keyword listed in one set must not appear
//! in another, since the classifier assigns each token to the first matching
//! set in priority order (demographics, sector, emotions, locations, brands).
//! Built once at process start; safe for concurrent reads from all
//! scheduler workers.

use std::collections::HashSet;
use std::sync::LazyLock;

pub(crate) static DEMOGRAPHICS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "male",
        "female",
        "man",
        "woman",
        "men",
        "women",
        "boy",
        "girl",
        "boys",
        "girls",
        "kids",
        "children",
        "teen",
        "teens",
        "teenager",
        "adult",
        "adults",
        "senior",
        "seniors",
        "elderly",
        "youth",
        "genz",
        "millennial",
        "millennials",
        "family",
        "parents",
        "students",
    ])
});

pub(crate) static SECTOR: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "tech",
        "technology",
        "beauty",
        "fashion",
        "food",
        "cooking",
        "travel",
        "sports",
        "fitness",
        "gaming",
        "music",
        "finance",
        "education",
        "health",
        "healthcare",
        "automotive",
        "realestate",
        "entertainment",
        "lifestyle",
        "business",
        "retail",
        "ecommerce",
        "art",
        "photography",
        "pets",
        "diy",
        "gardening",
        "science",
    ])
});

pub(crate) static EMOTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "happy",
        "happiness",
        "sad",
        "exciting",
        "excited",
        "excitement",
        "funny",
        "hilarious",
        "love",
        "romantic",
        "angry",
        "calm",
        "peaceful",
        "relaxing",
        "inspiring",
        "inspirational",
        "motivational",
        "joyful",
        "surprising",
        "shocking",
        "scary",
        "nostalgic",
        "heartwarming",
        "energetic",
        "dramatic",
    ])
});

pub(crate) static LOCATIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "newyork",
        "nyc",
        "losangeles",
        "chicago",
        "miami",
        "sanfrancisco",
        "london",
        "paris",
        "tokyo",
        "seoul",
        "berlin",
        "rome",
        "madrid",
        "dubai",
        "sydney",
        "toronto",
        "singapore",
        "hongkong",
        "amsterdam",
        "barcelona",
        "usa",
        "america",
        "europe",
        "asia",
        "california",
        "texas",
        "florida",
        "korea",
        "japan",
        "france",
        "italy",
    ])
});

pub(crate) static BRANDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "adidas",
        "nike",
        "puma",
        "apple",
        "samsung",
        "google",
        "microsoft",
        "amazon",
        "netflix",
        "spotify",
        "cocacola",
        "pepsi",
        "starbucks",
        "mcdonalds",
        "gucci",
        "prada",
        "chanel",
        "zara",
        "uniqlo",
        "ikea",
        "lego",
        "sony",
        "nintendo",
        "tesla",
        "toyota",
        "bmw",
        "mercedes",
        "sephora",
        "loreal",
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_are_disjoint() {
        let sets: [(&str, &HashSet<&'static str>); 5] = [
            ("demographics", &DEMOGRAPHICS),
            ("sector", &SECTOR),
            ("emotions", &EMOTIONS),
            ("locations", &LOCATIONS),
            ("brands", &BRANDS),
        ];

        for (i, (name_a, set_a)) in sets.iter().enumerate() {
            for (name_b, set_b) in sets.iter().skip(i + 1) {
                let overlap: Vec<_> = set_a.intersection(set_b).collect();
                assert!(
                    overlap.is_empty(),
                    "{} and {} share keywords: {:?}",
                    name_a,
                    name_b,
                    overlap
                );
            }
        }
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for set in [&DEMOGRAPHICS, &SECTOR, &EMOTIONS, &LOCATIONS, &BRANDS] {
            for keyword in set.iter() {
                assert_eq!(
                    *keyword,
                    keyword.to_lowercase().as_str(),
                    "keyword {} is not lowercase",
                    keyword
                );
            }
        }
    }
}
