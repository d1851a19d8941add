//! CSV loading and saving of skill tables and result matrices.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::core::processor::RankingRow;
use crate::error::{Result, SelectionError};
use crate::model::{ScoreMatrix, SkillTable};
use crate::optimization::AssignmentResult;

/// `Backend / Ops Team` -> `Backend___Ops_Team`
pub fn safe_file_name(name: &str) -> String {
    name.replace([' ', '/'], "_")
}

fn parse_cell(raw: &str, row: &str, column: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| {
        SelectionError::validation(format!(
            "value '{}' for '{}' in column '{}' is not a number",
            raw, row, column
        ))
    })
}

/// Read `<Index>,<skill1>,...` rows; the first column holds row names
pub fn read_skill_table<R: Read>(reader: R) -> Result<SkillTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut columns = headers.iter();
    let index_label = columns
        .next()
        .filter(|label| !label.is_empty())
        .unwrap_or("Name")
        .to_string();
    let skills: Vec<String> = columns.map(str::to_string).collect();
    if skills.is_empty() {
        return Err(SelectionError::validation(format!(
            "{} table has no skill columns",
            index_label
        )));
    }

    let mut names = Vec::new();
    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut cells = record.iter();
        let name = cells.next().unwrap_or_default().to_string();
        let row = cells
            .zip(&skills)
            .map(|(raw, skill)| parse_cell(raw, &name, skill))
            .collect::<Result<Vec<f64>>>()?;
        names.push(name);
        values.push(row);
    }

    SkillTable::new(index_label, names, skills, values)
}

pub fn load_skill_table(path: &Path) -> Result<SkillTable> {
    let file = fs::File::open(path).map_err(|e| {
        SelectionError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let table = read_skill_table(file)?;
    debug!(path = %path.display(), rows = table.len(), skills = table.skills().len(), "skill table loaded");
    Ok(table)
}

pub fn write_skill_table<W: Write>(writer: W, table: &SkillTable) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec![table.index_label().to_string()];
    header.extend(table.skills().iter().cloned());
    wtr.write_record(&header)?;
    for (name, row) in table.names().iter().zip(table.values()) {
        let mut record = vec![name.clone()];
        record.extend(row.iter().map(|v| format!("{:.1}", v)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// `Activity,<alternative...>` rows of coefficients with 6 decimals
pub fn write_score_matrix<W: Write>(writer: W, matrix: &ScoreMatrix) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["Activity".to_string()];
    header.extend(matrix.alternatives().iter().cloned());
    wtr.write_record(&header)?;
    for (activity, row) in matrix.activities().iter().zip(matrix.values()) {
        let mut record = vec![activity.clone()];
        record.extend(row.iter().map(|v| format!("{:.6}", v)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_score_matrix<R: Read>(reader: R) -> Result<ScoreMatrix> {
    let table = read_skill_table(reader)?;
    let alternatives = table.skills().to_vec();
    let activities = table.names().to_vec();
    ScoreMatrix::new(activities, alternatives, table.values().to_vec())
}

pub fn load_score_matrix(path: &Path) -> Result<ScoreMatrix> {
    read_score_matrix(fs::File::open(path)?)
}

/// `Activity,Rank 1..N` with `"name (0.xxxx)"` cells
pub fn write_ranking_matrix<W: Write>(writer: W, rows: &[RankingRow]) -> Result<()> {
    let width = rows.iter().map(|r| r.entries.len()).max().unwrap_or(0);
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["Activity".to_string()];
    header.extend((1..=width).map(|rank| format!("Rank {}", rank)));
    wtr.write_record(&header)?;
    for row in rows {
        let mut record = vec![row.activity.clone()];
        record.extend(row.entries.iter().cloned());
        record.resize(width + 1, String::new());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// `Activity,Assigned_Profile,Score` sorted by activity, then summary rows
pub fn write_assignment<W: Write>(writer: W, result: &AssignmentResult) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Activity", "Assigned_Profile", "Score"])?;

    let mut pairs: Vec<_> = result.pairs.iter().collect();
    pairs.sort_by(|a, b| a.activity.cmp(&b.activity));
    for pair in pairs {
        let score = format!("{:.6}", pair.score);
        wtr.write_record([pair.activity.as_str(), pair.alternative.as_str(), score.as_str()])?;
    }

    let method = result.method.to_string().to_uppercase();
    let count = result.n_assignments().to_string();
    let total = format!("{:.6}", result.total_score);
    let average = format!("{:.6}", result.average_score);
    wtr.write_record(["", "", ""])?;
    wtr.write_record(["SUMMARY", "", ""])?;
    wtr.write_record(["Method", method.as_str(), ""])?;
    wtr.write_record(["Total Assignments", count.as_str(), ""])?;
    wtr.write_record(["Sum of Proximity Values", "(All Assigned Pairs)", total.as_str()])?;
    wtr.write_record(["Average Proximity", "(Per Assignment)", average.as_str()])?;
    if !result.unassigned_alternatives.is_empty() {
        let names = result.unassigned_alternatives.join(" ");
        wtr.write_record(["Unassigned Profiles", names.as_str(), ""])?;
    }
    if !result.unassigned_activities.is_empty() {
        let names = result.unassigned_activities.join(" ");
        wtr.write_record(["Unassigned Activities", names.as_str(), ""])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Create `path` (and parents) and hand a buffered writer to `write`
pub fn save_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(std::io::BufWriter<fs::File>) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write(std::io::BufWriter::new(file))?;
    debug!(path = %path.display(), "file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{AssignmentMethod, AssignmentSolver};

    const PROFILES: &str = "Profile,Rust,SQL\nAlice,4,4\nBob, 2 ,6\n";

    #[test]
    fn reads_labelled_table() {
        let table = read_skill_table(PROFILES.as_bytes()).unwrap();
        assert_eq!(table.index_label(), "Profile");
        assert_eq!(table.names(), &["Alice".to_string(), "Bob".to_string()]);
        assert_eq!(table.skills(), &["Rust".to_string(), "SQL".to_string()]);
        assert_eq!(table.values()[1], vec![2.0, 6.0]);
    }

    #[test]
    fn non_numeric_cell_is_validation_error() {
        let err = read_skill_table("Profile,Rust\nAlice,high\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SelectionError::Validation(_)));
        assert!(err.to_string().contains("'high'"));
    }

    #[test]
    fn ragged_row_is_csv_error() {
        let err = read_skill_table("Profile,Rust,SQL\nAlice,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SelectionError::Csv(_)));
    }

    #[test]
    fn safe_names_replace_spaces_and_slashes() {
        assert_eq!(safe_file_name("Data Ops/ML"), "Data_Ops_ML");
    }

    #[test]
    fn score_matrix_uses_six_decimals() {
        let matrix = ScoreMatrix::new(
            vec!["Backend".into()],
            vec!["Alice".into(), "Bob".into()],
            vec![vec![0.617_4, 1.0 / 3.0]],
        )
        .unwrap();
        let mut out = Vec::new();
        write_score_matrix(&mut out, &matrix).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Activity,Alice,Bob\nBackend,0.617400,0.333333\n");

        let back = read_score_matrix(text.as_bytes()).unwrap();
        assert_eq!(back.alternatives(), matrix.alternatives());
        assert_eq!(back.get(0, 0), 0.6174);
    }

    #[test]
    fn ranking_matrix_pads_short_rows() {
        let rows = vec![
            RankingRow {
                activity: "A".into(),
                entries: vec!["P1 (0.9000)".into(), "P2 (0.1000)".into()],
            },
            RankingRow {
                activity: "B".into(),
                entries: vec!["P2 (0.5000)".into()],
            },
        ];
        let mut out = Vec::new();
        write_ranking_matrix(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Activity,Rank 1,Rank 2\nA,P1 (0.9000),P2 (0.1000)\nB,P2 (0.5000),\n"
        );
    }

    #[test]
    fn assignment_rows_sorted_with_summary() {
        let matrix = ScoreMatrix::new(
            vec!["Zeta".into(), "Alpha".into()],
            vec!["P1".into(), "P2".into()],
            vec![vec![0.9, 0.8], vec![0.8, 0.1]],
        )
        .unwrap();
        let mut solver = AssignmentSolver::new(matrix);
        let result = solver.solve(AssignmentMethod::Auto).unwrap();

        let mut out = Vec::new();
        write_assignment(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Activity,Assigned_Profile,Score");
        assert_eq!(lines[1], "Alpha,P1,0.800000");
        assert_eq!(lines[2], "Zeta,P2,0.800000");
        assert!(lines.contains(&"Method,EXACT,"));
        assert!(lines.contains(&"Sum of Proximity Values,(All Assigned Pairs),1.600000"));
    }
}
