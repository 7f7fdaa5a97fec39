/// Starter epigrams inserted by `--seed`.
pub const STARTER_EPIGRAMS: &[(&str, Option<&str>)] = &[
    ("Simplicity is the ultimate sophistication.", Some("Leonardo da Vinci")),
    (
        "Programs must be written for people to read, and only incidentally for machines to execute.",
        Some("Harold Abelson"),
    ),
    ("Premature optimization is the root of all evil.", Some("Donald Knuth")),
    ("Perfect is the enemy of good.", Some("Voltaire")),
    ("Talk is cheap. Show me the code.", Some("Linus Torvalds")),
];
