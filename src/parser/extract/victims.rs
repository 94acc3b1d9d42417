use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::record::{Gender, Victim};

// "<index>. <name>, <role>, <Male|Female>, <age> Years"
static VICTIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\.\s*([^,]+),\s*([^,]+),\s*(Male|Female),\s*(\w+)\s*Years?").unwrap()
});

/// Parse the victims listed in a "Persons Killed" section, in order.
/// Entries with an unreadable age are skipped; anything unmatched is ignored.
pub fn parse_victims(section: &str) -> Vec<Victim> {
    VICTIM_RE
        .captures_iter(section)
        .filter_map(|caps| {
            let age = match caps[4].parse::<u32>() {
                Ok(age) => age,
                Err(_) => {
                    debug!("dropping victim {:?}: bad age {:?}", caps[1].trim(), &caps[4]);
                    return None;
                }
            };
            Some(Victim {
                name: non_empty(&caps[1]),
                role: non_empty(&caps[2]),
                gender: Gender::parse(&caps[3]),
                age: Some(age),
            })
        })
        .collect()
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_victim() {
        let v = parse_victims(" 1. Ram Lal, Loader, Male, 34 Years");
        assert_eq!(
            v,
            vec![Victim {
                name: Some("Ram Lal".into()),
                role: Some("Loader".into()),
                gender: Some(Gender::Male),
                age: Some(34),
            }]
        );
    }

    #[test]
    fn several_victims_in_order() {
        let section = "1. Ram Lal, Loader, Male, 34 Years\n\
                       2. Sita Devi, Sweeper, FEMALE, 29 Years\n\
                       3. Mohan\n   Singh, Driller, male, 41 Years";
        let v = parse_victims(section);
        let names: Vec<_> = v.iter().map(|x| x.name.as_deref().unwrap()).collect();
        assert_eq!(names, ["Ram Lal", "Sita Devi", "Mohan Singh"]);
        assert_eq!(v[1].gender, Some(Gender::Female));
        assert_eq!(v[2].age, Some(41));
    }

    #[test]
    fn bad_age_drops_only_that_victim() {
        let section = "1. A B, Loader, Male, NA Years 2. C D, Fitter, Male, 50 Years";
        let v = parse_victims(section);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].name.as_deref(), Some("C D"));
    }

    #[test]
    fn unmatched_text_ignored() {
        assert!(parse_victims("One unnamed worker").is_empty());
        assert!(parse_victims("").is_empty());
    }
}
