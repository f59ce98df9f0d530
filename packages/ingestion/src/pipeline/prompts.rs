//! Prompt construction for document extraction.
//!
//! Prompts carry the user's existing category names so suggestions are
//! biased toward reusing the taxonomy instead of inventing near
//! duplicates.

/// Prompt for single-receipt extraction.
pub fn receipt_prompt(existing_expense_categories: &[String]) -> String {
    let mut prompt = String::from(
        "Analyze this receipt image and extract the purchase details.\n\
         Rules:\n\
         - date must be the purchase date in YYYY-MM-DD format\n\
         - amount must be the positive grand total actually paid\n\
         - leave fields you cannot read as null, do not guess\n",
    );

    if !existing_expense_categories.is_empty() {
        prompt.push_str(
            "\nThe user already has these expense categories. Reuse one of \
             them for suggested_category when it fits; only propose a new \
             name when none apply:\n",
        );
        for name in existing_expense_categories {
            prompt.push_str("- ");
            prompt.push_str(name);
            prompt.push('\n');
        }
    }

    prompt
}

/// Prompt for multi-row bank statement extraction.
pub fn statement_prompt(
    existing_income_categories: &[String],
    existing_expense_categories: &[String],
) -> String {
    let mut prompt = String::from(
        "Analyze this bank statement and extract every transaction row.\n\
         Rules:\n\
         - dates must be in YYYY-MM-DD format\n\
         - amounts must be positive; use type INCOME for credits and \
           EXPENSE for debits\n\
         - parse the merchant name out of the description when possible\n\
         - include account metadata only if printed on the statement\n",
    );

    push_category_block(&mut prompt, "income", existing_income_categories);
    push_category_block(&mut prompt, "expense", existing_expense_categories);

    prompt
}

fn push_category_block(prompt: &mut String, label: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    prompt.push_str(&format!(
        "\nExisting {} categories (prefer these for suggested_category):\n",
        label
    ));
    for name in names {
        prompt.push_str("- ");
        prompt.push_str(name);
        prompt.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_prompt_lists_existing_categories() {
        let prompt = receipt_prompt(&["Groceries".into(), "Dining".into()]);
        assert!(prompt.contains("- Groceries"));
        assert!(prompt.contains("- Dining"));
    }

    #[test]
    fn receipt_prompt_without_categories_omits_block() {
        let prompt = receipt_prompt(&[]);
        assert!(!prompt.contains("already has these"));
    }

    #[test]
    fn statement_prompt_separates_income_and_expense() {
        let prompt = statement_prompt(&["Salary".into()], &["Rent".into()]);
        assert!(prompt.contains("income categories"));
        assert!(prompt.contains("- Salary"));
        assert!(prompt.contains("expense categories"));
        assert!(prompt.contains("- Rent"));
    }
}
