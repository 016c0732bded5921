//! Built-in cards and questions, shown when the catalog service yields nothing.

use super::{CategoryCard, QuestionCatalog};

/// The four browsable cards, in display order.
pub fn default_cards() -> Vec<CategoryCard> {
    vec![
        CategoryCard::new(
            "Colleges",
            "Find the perfect college",
            &["All", "Admissions", "Fees", "Facility", "Placements"],
        ),
        CategoryCard::new(
            "Exams",
            "Prepare for entrance exams",
            &["All", "Syllabus", "Dates", "Eligibility"],
        ),
        CategoryCard::new(
            "Scholarships",
            "Explore funding options",
            &["All", "Government", "Private", "By College"],
        ),
        CategoryCard::new(
            "College Predictions",
            "Predict your admission chances",
            &["All", "By Rank", "By Score"],
        ),
    ]
}

/// Questions for every default card/sub-tab pair.
pub fn fallback_catalog() -> QuestionCatalog {
    QuestionCatalog::new()
        .with(
            "Colleges",
            "All",
            [
                "What are the top colleges in India?",
                "How to choose the right college?",
                "What are admission requirements?",
            ],
        )
        .with(
            "Colleges",
            "Admissions",
            [
                "What is the admission process?",
                "What documents are needed?",
                "When are application deadlines?",
            ],
        )
        .with(
            "Colleges",
            "Fees",
            [
                "What are the tuition fees?",
                "Are there scholarships available?",
                "What are payment options?",
            ],
        )
        .with(
            "Colleges",
            "Facility",
            [
                "What facilities are available?",
                "What is the campus like?",
                "Are there hostels?",
            ],
        )
        .with(
            "Colleges",
            "Placements",
            [
                "What are placement statistics?",
                "Which companies visit?",
                "What is the average salary?",
            ],
        )
        .with(
            "Exams",
            "All",
            [
                "What exams should I take?",
                "How to prepare for entrance exams?",
                "What are the exam patterns?",
            ],
        )
        .with(
            "Exams",
            "Syllabus",
            [
                "What is the exam syllabus?",
                "Which topics are important?",
                "How to cover the syllabus?",
            ],
        )
        .with(
            "Exams",
            "Dates",
            [
                "When are the exam dates?",
                "What is the application timeline?",
                "Are there multiple exam sessions?",
            ],
        )
        .with(
            "Exams",
            "Eligibility",
            [
                "What are the eligibility criteria?",
                "What qualifications are required?",
                "Are there age restrictions?",
            ],
        )
        .with(
            "Scholarships",
            "All",
            [
                "What scholarships are available?",
                "How to apply for scholarships?",
                "What are the eligibility criteria?",
            ],
        )
        .with(
            "Scholarships",
            "Government",
            [
                "What government scholarships exist?",
                "How to apply for government schemes?",
                "What documents are needed?",
            ],
        )
        .with(
            "Scholarships",
            "Private",
            [
                "What private scholarships are available?",
                "How to find private funding?",
                "What are the application processes?",
            ],
        )
        .with(
            "Scholarships",
            "By College",
            [
                "Which colleges offer scholarships?",
                "What are college-specific scholarships?",
                "How to apply through colleges?",
            ],
        )
        .with(
            "College Predictions",
            "All",
            [
                "How to predict college admission?",
                "What factors affect predictions?",
                "How accurate are predictions?",
            ],
        )
        .with(
            "College Predictions",
            "By Rank",
            [
                "How does rank affect admission?",
                "What ranks get which colleges?",
                "How to improve my rank?",
            ],
        )
        .with(
            "College Predictions",
            "By Score",
            [
                "How do scores affect admission?",
                "What scores are required?",
                "How to calculate admission chances?",
            ],
        )
}
