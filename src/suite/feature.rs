//! Parsing `.feature` files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HabitableError, Result};

/// Keywords that start a step line.
const STEP_KEYWORDS: &[&str] = &["Given", "When", "Then", "And", "But", "*"];

/// A parsed feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub path: PathBuf,
    pub background: Vec<Step>,
    pub scenarios: Vec<Scenario>,
}

/// A scenario, with outline examples already expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub line: usize,
    pub tags: Vec<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub keyword: String,
    pub text: String,
    pub line: usize,
}

#[derive(Debug)]
enum Section {
    Preamble,
    Description,
    Background,
    Scenario(PendingScenario),
}

#[derive(Debug)]
struct PendingScenario {
    scenario: Scenario,
    outline: bool,
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    in_examples: bool,
}

impl PendingScenario {
    fn finish(self, out: &mut Vec<Scenario>) {
        let Some(header) = self.header.filter(|_| self.outline) else {
            out.push(self.scenario);
            return;
        };

        for (index, row) in self.rows.iter().enumerate() {
            let fill = |text: &str| {
                header
                    .iter()
                    .zip(row)
                    .fold(text.to_string(), |acc, (name, value)| {
                        acc.replace(&format!("<{}>", name), value)
                    })
            };
            out.push(Scenario {
                name: format!("{} #{}", fill(&self.scenario.name), index + 1),
                line: self.scenario.line,
                tags: self.scenario.tags.clone(),
                steps: self
                    .scenario
                    .steps
                    .iter()
                    .map(|step| Step {
                        keyword: step.keyword.clone(),
                        text: fill(&step.text),
                        line: step.line,
                    })
                    .collect(),
            });
        }
    }
}

/// Parse the text of a feature file.
pub fn parse_feature(path: &Path, content: &str) -> Result<Feature> {
    let error = |line: usize, message: &str| HabitableError::FeatureParse {
        path: path.to_path_buf(),
        line,
        message: message.to_string(),
    };

    let mut feature = Feature {
        name: String::new(),
        path: path.to_path_buf(),
        background: Vec::new(),
        scenarios: Vec::new(),
    };
    let mut section = Section::Preamble;
    let mut tags: Vec<String> = Vec::new();
    let mut in_doc_string = false;

    for (index, raw) in content.lines().enumerate() {
        let number = index + 1;
        let line = raw.trim();

        if line.starts_with("\"\"\"") || line.starts_with("```") {
            in_doc_string = !in_doc_string;
            continue;
        }
        if in_doc_string || line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('@') {
            tags.extend(line.split_whitespace().map(str::to_string));
            continue;
        }

        if let Some(name) = keyword_value(line, "Feature") {
            if !matches!(section, Section::Preamble) {
                return Err(error(number, "only one Feature is allowed per file"));
            }
            feature.name = name;
            tags.clear();
            section = Section::Description;
            continue;
        }

        if matches!(section, Section::Preamble) {
            return Err(error(number, "expected 'Feature:'"));
        }

        if keyword_value(line, "Background").is_some() {
            finish(&mut section, &mut feature.scenarios);
            section = Section::Background;
            continue;
        }

        let scenario = keyword_value(line, "Scenario Outline")
            .or_else(|| keyword_value(line, "Scenario Template"))
            .map(|name| (name, true))
            .or_else(|| keyword_value(line, "Scenario").map(|name| (name, false)))
            .or_else(|| keyword_value(line, "Example").map(|name| (name, false)));
        if let Some((name, outline)) = scenario {
            finish(&mut section, &mut feature.scenarios);
            section = Section::Scenario(PendingScenario {
                scenario: Scenario {
                    name,
                    line: number,
                    tags: std::mem::take(&mut tags),
                    steps: Vec::new(),
                },
                outline,
                header: None,
                rows: Vec::new(),
                in_examples: false,
            });
            continue;
        }

        if keyword_value(line, "Examples").is_some() || keyword_value(line, "Scenarios").is_some() {
            match &mut section {
                Section::Scenario(pending) if pending.outline => pending.in_examples = true,
                _ => return Err(error(number, "'Examples:' outside of a Scenario Outline")),
            }
            continue;
        }

        if line.starts_with('|') {
            if let Section::Scenario(pending) = &mut section {
                if pending.in_examples {
                    let cells = table_cells(line);
                    if pending.header.is_none() {
                        pending.header = Some(cells);
                    } else {
                        pending.rows.push(cells);
                    }
                    continue;
                }
            }
            tracing::debug!("{}:{}: ignoring data table row", path.display(), number);
            continue;
        }

        if let Some(step) = parse_step(line, number) {
            match &mut section {
                Section::Background => feature.background.push(step),
                Section::Scenario(pending) if !pending.in_examples => {
                    pending.scenario.steps.push(step)
                }
                _ => return Err(error(number, "step outside of a scenario")),
            }
            continue;
        }

        let has_steps = match &section {
            Section::Background => !feature.background.is_empty(),
            Section::Scenario(pending) => !pending.scenario.steps.is_empty(),
            _ => false,
        };
        if has_steps {
            return Err(error(number, &format!("unexpected line '{}'", line)));
        }
    }

    if matches!(section, Section::Preamble) {
        return Err(error(content.lines().count().max(1), "expected 'Feature:'"));
    }
    finish(&mut section, &mut feature.scenarios);
    Ok(feature)
}

fn finish(section: &mut Section, scenarios: &mut Vec<Scenario>) {
    if let Section::Scenario(pending) = std::mem::replace(section, Section::Description) {
        pending.finish(scenarios);
    }
}

fn keyword_value(line: &str, keyword: &str) -> Option<String> {
    line.strip_prefix(keyword)
        .and_then(|rest| rest.strip_prefix(':'))
        .map(|rest| rest.trim().to_string())
}

fn parse_step(line: &str, number: usize) -> Option<Step> {
    STEP_KEYWORDS.iter().find_map(|keyword| {
        let rest = line.strip_prefix(keyword)?;
        if !rest.starts_with(' ') {
            return None;
        }
        Some(Step {
            keyword: keyword.to_string(),
            text: rest.trim().to_string(),
            line: number,
        })
    })
}

fn table_cells(line: &str) -> Vec<String> {
    line.trim()
        .trim_start_matches('|')
        .trim_end_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// Read and parse a feature file.
pub fn load_feature(path: &Path) -> Result<Feature> {
    let content = fs::read_to_string(path).map_err(|e| HabitableError::FeatureParse {
        path: path.to_path_buf(),
        line: 0,
        message: e.to_string(),
    })?;
    parse_feature(path, &content)
}

/// Load features from files and directories. Directories are searched
/// recursively for `*.feature` files, in sorted order.
pub fn load_features<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Feature>> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let mut found = Vec::new();
            collect_feature_files(path, &mut found)?;
            found.sort();
            files.extend(found);
        } else {
            files.push(path.to_path_buf());
        }
    }

    tracing::debug!("loading {} feature files", files.len());
    files.iter().map(|file| load_feature(file)).collect()
}

fn collect_feature_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_feature_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "feature") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Feature> {
        parse_feature(Path::new("test.feature"), content)
    }

    #[test]
    fn parses_scenarios_and_steps() {
        let feature = parse(
            r#"
# a comment
Feature: Cukes
  Some description of the feature.

  Scenario: Eating
    Given I have 5 cukes
    When I eat 3
    Then I should have 2 cukes

  Scenario: Counting
    * I have 1 cuke
"#,
        )
        .unwrap();

        assert_eq!(feature.name, "Cukes");
        assert_eq!(feature.scenarios.len(), 2);
        assert_eq!(feature.scenarios[0].name, "Eating");
        assert_eq!(feature.scenarios[0].steps.len(), 3);
        assert_eq!(feature.scenarios[0].steps[1].keyword, "When");
        assert_eq!(feature.scenarios[0].steps[1].text, "I eat 3");
        assert_eq!(feature.scenarios[0].steps[1].line, 8);
        assert_eq!(feature.scenarios[1].steps[0].keyword, "*");
    }

    #[test]
    fn collects_background_and_tags() {
        let feature = parse(
            r#"
@feature-tag
Feature: Tags
  Background:
    Given a clean slate

  @smoke @fast
  Scenario: Tagged
    Then it works
"#,
        )
        .unwrap();

        assert_eq!(feature.background.len(), 1);
        assert_eq!(feature.scenarios[0].tags, vec!["@smoke", "@fast"]);
    }

    #[test]
    fn expands_scenario_outlines() {
        let feature = parse(
            r#"
Feature: Outline
  Scenario Outline: Eating <start>
    Given I have <start> cukes
    When I eat <eat>

    Examples:
      | start | eat |
      | 12    | 5   |
      | 20    | 5   |
"#,
        )
        .unwrap();

        assert_eq!(feature.scenarios.len(), 2);
        assert_eq!(feature.scenarios[0].name, "Eating 12 #1");
        assert_eq!(feature.scenarios[1].steps[0].text, "I have 20 cukes");
        assert_eq!(feature.scenarios[1].steps[1].text, "I eat 5");
    }

    #[test]
    fn skips_doc_strings_and_data_tables() {
        let feature = parse(
            r#"
Feature: Extras
  Scenario: With extras
    Given a document
      """
      Then this is not a step
      """
    And a table
      | a | b |
    Then done
"#,
        )
        .unwrap();

        let texts: Vec<_> = feature.scenarios[0]
            .steps
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a document", "a table", "done"]);
    }

    #[test]
    fn step_before_scenario_is_an_error() {
        let err = parse("Feature: Bad\n  Given nothing\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "test.feature:2: step outside of a scenario"
        );
    }

    #[test]
    fn missing_feature_keyword_is_an_error() {
        assert!(parse("Scenario: orphan\n  Given x\n").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn loads_directories_recursively_in_order() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("b.feature"), "Feature: B\n").unwrap();
        fs::write(temp.path().join("nested/a.feature"), "Feature: A\n").unwrap();
        fs::write(temp.path().join("notes.md"), "ignored").unwrap();

        let features = load_features(&[temp.path()]).unwrap();
        let names: Vec<_> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
