// SPDX-License-Identifier: Apache-2.0

use crate::error::ClientError;
use crate::prefs::FilterLabels;
use keepsake_model::Tag;

/// One numbered answer of the upload category prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChoice {
    pub number: usize,
    pub tag: Tag,
    pub label: String,
}

/// The three known tags in prompt order, labelled with the user's filter names.
pub fn category_choices(labels: &FilterLabels<'_>) -> Result<Vec<CategoryChoice>, ClientError> {
    let all = labels.load()?;
    Ok(Tag::KNOWN
        .iter()
        .enumerate()
        .map(|(i, tag)| CategoryChoice {
            number: i + 1,
            tag: Tag::new(*tag),
            label: all.get(*tag).cloned().unwrap_or_else(|| (*tag).to_string()),
        })
        .collect())
}

#[must_use]
pub fn prompt_text(choices: &[CategoryChoice]) -> String {
    let mut text = String::from("Where should these photos be stored?\n");
    for choice in choices {
        text.push_str(&format!("{}) {}\n", choice.number, choice.label));
    }
    text.push_str("Enter 1, 2, or 3:");
    text
}

/// `1`, `2` and `3` pick a known tag; any other answer picks the default.
#[must_use]
pub fn tag_for_answer(answer: &str) -> Tag {
    match answer.trim().parse::<usize>() {
        Ok(n @ 1..=3) => Tag::new(Tag::KNOWN[n - 1]),
        _ => Tag::default(),
    }
}
