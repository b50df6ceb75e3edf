//! Prefix classification of manifest pages into sections.
//!
//! The manifest is folded with an accumulator holding the currently active
//! section: a page whose title starts with a section header switches the
//! active section, and every page is filed under whichever section is active
//! when it is reached. Pages before the first header belong to no group.

use tracing::{debug, instrument};

use folio_shared::sanitize::{fold_upper, strip_title_punctuation};
use folio_shared::{FolioError, Group, GroupingSchema, Manifest, PREFIX_STRATEGY, Result};

/// Classify manifest pages into groups according to `schema`.
///
/// Groups are emitted in section-table order with empty groups omitted. Each
/// group lists its page files in manifest order. Fails with
/// [`FolioError::Config`] for any strategy other than `"prefix"`.
#[instrument(skip_all, fields(pages = manifest.len(), sections = schema.sections.len()))]
pub fn group_pages(manifest: &Manifest, schema: &GroupingSchema) -> Result<Vec<Group>> {
    if schema.kind != PREFIX_STRATEGY {
        return Err(FolioError::config(format!(
            "unknown grouping strategy '{}' (expected '{PREFIX_STRATEGY}')",
            schema.kind
        )));
    }

    let keys: Vec<String> = schema.sections.iter().map(|s| match_key(s)).collect();
    let initial: (Option<usize>, Vec<Vec<String>>) = (None, vec![Vec::new(); keys.len()]);

    let (_, buckets) = manifest
        .iter()
        .fold(initial, |(active, mut buckets), record| {
            let active = matching_section(&match_key(&record.title), &keys).or(active);
            if let Some(i) = active {
                buckets[i].push(record.file.clone());
            } else {
                debug!(title = %record.title, "page precedes first section, not grouped");
            }
            (active, buckets)
        });

    let groups: Vec<Group> = schema
        .sections
        .iter()
        .zip(buckets)
        .filter(|(_, files)| !files.is_empty())
        .map(|(section, files)| Group {
            name: title_case(section),
            files,
        })
        .collect();

    debug!(groups = groups.len(), "pages grouped");
    Ok(groups)
}

/// Index of the first section whose key prefixes `title_key`.
fn matching_section(title_key: &str, section_keys: &[String]) -> Option<usize> {
    section_keys
        .iter()
        .position(|key| !key.is_empty() && title_key.starts_with(key.as_str()))
}

/// Comparison form of a title or section header.
///
/// Drops the same punctuation the page sanitizer drops (hyphens survive),
/// reads `_` as a space, transliterates, upper-cases and collapses
/// whitespace. The sanitized title `PREMIERE_SECTION__JE_CROIS____NOUS_CROYONS`
/// and the header `PREMIERE SECTION "JE CROIS" – "NOUS CROYONS"` share a key.
pub fn match_key(text: &str) -> String {
    let stripped = strip_title_punctuation(text).replace('_', " ");
    fold_upper(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case like Python's `str.title()`.
///
/// A letter is upper-cased when it follows a non-letter and lower-cased
/// otherwise, so `"L'HOMME"` becomes `"L'Homme"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_shared::PageRecord;
    use folio_shared::sanitize::page_stem;

    fn manifest(entries: &[(&str, &str)]) -> Manifest {
        entries
            .iter()
            .map(|(title, file)| PageRecord {
                title: title.to_string(),
                url: format!("https://example.com/{file}"),
                file: file.to_string(),
            })
            .collect()
    }

    fn files(group: &Group) -> Vec<&str> {
        group.files.iter().map(String::as_str).collect()
    }

    #[test]
    fn scenario_prologue_and_first_section() {
        let m = manifest(&[
            ("Prologue Intro", "001.md"),
            ("Premiere Section Je Crois Foi", "002.md"),
            ("Autre Chose", "003.md"),
        ]);
        let schema = GroupingSchema::prefix(["PROLOGUE", "PREMIERE SECTION"]);

        let groups = group_pages(&m, &schema).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Prologue");
        assert_eq!(files(&groups[0]), ["001.md"]);
        assert_eq!(groups[1].name, "Premiere Section");
        assert_eq!(files(&groups[1]), ["002.md", "003.md"]);
    }

    #[test]
    fn leading_unmatched_pages_are_dropped() {
        let m = manifest(&[
            ("Avant-propos", "001.md"),
            ("Lettre apostolique", "002.md"),
            ("PROLOGUE", "003.md"),
            ("Suite", "004.md"),
        ]);
        let groups = group_pages(&m, &GroupingSchema::prefix(["PROLOGUE"])).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(files(&groups[0]), ["003.md", "004.md"]);
    }

    #[test]
    fn nothing_matches_yields_no_groups() {
        let m = manifest(&[("Alpha", "001.md"), ("Beta", "002.md")]);
        let groups = group_pages(&m, &GroupingSchema::prefix(["PROLOGUE"])).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn earlier_table_entry_wins_ties() {
        let m = manifest(&[("PREMIERE SECTION LA PRIERE", "001.md")]);
        let schema = GroupingSchema::prefix(["PREMIERE", "PREMIERE SECTION"]);

        let groups = group_pages(&m, &schema).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Premiere");
    }

    #[test]
    fn output_follows_table_order_not_manifest_order() {
        let m = manifest(&[
            ("TROISIEME PARTIE", "001.md"),
            ("PROLOGUE", "002.md"),
        ]);
        let schema = GroupingSchema::prefix(["PROLOGUE", "TROISIEME PARTIE"]);

        let groups = group_pages(&m, &schema).unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();

        assert_eq!(names, ["Prologue", "Troisieme Partie"]);
    }

    #[test]
    fn revisited_section_keeps_appending() {
        let m = manifest(&[
            ("PROLOGUE", "001.md"),
            ("DEUXIEME PARTIE", "002.md"),
            ("PROLOGUE bis", "003.md"),
        ]);
        let schema = GroupingSchema::prefix(["PROLOGUE", "DEUXIEME PARTIE"]);

        let groups = group_pages(&m, &schema).unwrap();

        assert_eq!(files(&groups[0]), ["001.md", "003.md"]);
        assert_eq!(files(&groups[1]), ["002.md"]);
    }

    #[test]
    fn groups_are_contiguous_runs_between_headers() {
        let m = manifest(&[
            ("PROLOGUE", "001.md"),
            ("a", "002.md"),
            ("b", "003.md"),
            ("TROISIEME PARTIE", "004.md"),
            ("c", "005.md"),
        ]);
        let schema = GroupingSchema::prefix(["PROLOGUE", "TROISIEME PARTIE"]);
        let groups = group_pages(&m, &schema).unwrap();

        let all: Vec<&str> = m.iter().map(|r| r.file.as_str()).collect();
        for group in &groups {
            let start = all.iter().position(|f| *f == group.files[0]).unwrap();
            assert_eq!(&all[start..start + group.files.len()], files(group).as_slice());
        }
    }

    #[test]
    fn sanitized_titles_match_default_table() {
        let titles = [
            "PROLOGUE",
            "PREMIÈRE SECTION « JE CROIS » – « NOUS CROYONS »",
            "CHAPITRE PREMIER L'HOMME EST « CAPABLE » DE DIEU",
            "DEUXIÈME PARTIE LA CÉLÉBRATION DU MYSTÈRE CHRÉTIEN",
            "TROISIÈME PARTIE LA VIE DANS LE CHRIST",
            "PREMIÈRE SECTION LA PRIÈRE DANS LA VIE CHRÉTIENNE",
        ];
        let m: Manifest = titles
            .iter()
            .enumerate()
            .map(|(i, t)| PageRecord {
                title: page_stem(t),
                url: String::new(),
                file: format!("{:03}_{}.md", i + 1, page_stem(t)),
            })
            .collect();

        let groups = group_pages(&m, &GroupingSchema::default()).unwrap();
        let sizes: Vec<usize> = groups.iter().map(|g| g.files.len()).collect();

        assert_eq!(groups.len(), 5);
        assert_eq!(sizes, [1, 2, 1, 1, 1]);
        assert_eq!(groups[1].name, "Premiere Section \"Je Crois\" – \"Nous Croyons\"");
    }

    #[test]
    fn grouping_is_idempotent() {
        let m = manifest(&[("PROLOGUE", "001.md"), ("x", "002.md")]);
        let schema = GroupingSchema::default();
        assert_eq!(group_pages(&m, &schema).unwrap(), group_pages(&m, &schema).unwrap());
    }

    #[test]
    fn unknown_strategy_is_config_error() {
        let schema = GroupingSchema {
            kind: "regex".into(),
            sections: vec!["PROLOGUE".into()],
        };
        let err = group_pages(&Manifest::new(), &schema).unwrap_err();
        assert!(matches!(err, FolioError::Config { .. }));
    }

    #[test]
    fn title_case_matches_python_semantics() {
        assert_eq!(title_case("PROLOGUE"), "Prologue");
        assert_eq!(title_case("TROISIEME PARTIE LA VIE DANS LE CHRIST"), "Troisieme Partie La Vie Dans Le Christ");
        assert_eq!(title_case("L'HOMME"), "L'Homme");
        assert_eq!(title_case("\"JE CROIS\""), "\"Je Crois\"");
    }

    #[test]
    fn match_key_folds_sanitized_and_raw_forms() {
        assert_eq!(
            match_key("PREMIERE_SECTION__JE_CROIS____NOUS_CROYONS"),
            "PREMIERE SECTION JE CROIS NOUS CROYONS"
        );
        assert_eq!(
            match_key("PREMIERE SECTION \"JE CROIS\" – \"NOUS CROYONS\""),
            "PREMIERE SECTION JE CROIS NOUS CROYONS"
        );
        assert_eq!(match_key("  Prière   "), "PRIERE");
    }

    #[test]
    fn match_key_keeps_hyphens_significant() {
        assert_eq!(match_key("PRO-LOGUE"), "PRO-LOGUE");
        assert_ne!(match_key("PRO-LOGUE"), match_key("PROLOGUE"));

        let m = manifest(&[("PRO-LOGUE", "001.md"), ("PROLOGUE", "002.md")]);
        let groups = group_pages(&m, &GroupingSchema::prefix(["PROLOGUE"])).unwrap();
        assert_eq!(files(&groups[0]), ["002.md"]);
    }

    #[test]
    fn match_key_agrees_with_page_sanitizer() {
        let raw = "PREMIÈRE SECTION « JE CROIS » – « NOUS CROYONS »";
        assert_eq!(match_key(&page_stem(raw)), match_key(raw));
        assert_eq!(match_key("Édition ©"), "EDITION");
    }
}
