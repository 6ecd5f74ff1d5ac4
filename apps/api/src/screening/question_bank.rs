/// Parses an uploaded question bank.
///
/// `.csv` files contribute the first column of each line; anything else is
/// read one question per line. Blank entries are dropped and duplicates keep
/// their first position.
pub fn parse_question_bank(file_name: &str, content: &str) -> Vec<String> {
    let is_csv = file_name.to_lowercase().ends_with(".csv");
    let questions = content.lines().map(|line| {
        let line = line.trim();
        if is_csv {
            line.split(',').next().unwrap_or("").trim()
        } else {
            line
        }
    });
    dedup_questions(questions)
}

/// Trims, drops blanks and removes repeats, preserving order.
pub fn dedup_questions<I, S>(questions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut unique: Vec<String> = Vec::new();
    for question in questions {
        let question = question.as_ref().trim();
        if !question.is_empty() && !unique.iter().any(|q| q == question) {
            unique.push(question.to_string());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_bank_reads_lines_and_dedups() {
        let content = "What is a deadlock?\n\n  Explain MVCC.  \nWhat is a deadlock?\n";
        assert_eq!(
            parse_question_bank("bank.txt", content),
            vec!["What is a deadlock?".to_string(), "Explain MVCC.".to_string()]
        );
    }

    #[test]
    fn test_csv_bank_uses_first_column() {
        let content = "Explain CAP, distributed\nWhat is Raft?,consensus,hard\n,orphan\n";
        assert_eq!(
            parse_question_bank("Questions.CSV", content),
            vec!["Explain CAP".to_string(), "What is Raft?".to_string()]
        );
    }

    #[test]
    fn test_text_bank_keeps_commas() {
        assert_eq!(
            parse_question_bank("bank.md", "Compare B-trees, LSM trees\n"),
            vec!["Compare B-trees, LSM trees".to_string()]
        );
    }

    #[test]
    fn test_empty_bank() {
        assert!(parse_question_bank("bank.txt", " \n\n").is_empty());
    }
}
