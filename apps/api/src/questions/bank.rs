//! Question bank: hand-authored technical questions per normalized keyword,
//! plus a generic bucket.
//!
//! Built once on first use and never mutated, so every session shares it
//! without locking. Lookup is exact-match on the normalized keyword.

use std::collections::HashMap;

use once_cell::sync::Lazy;

const TECH_QUESTIONS: &[(&str, &[&str])] = &[
    (
        "python",
        &[
            "Explain list vs tuple and when to use each.",
            "What are generators? Show a simple example.",
            "How does the GIL impact multithreading in Python?",
            "Describe context managers and the 'with' statement.",
        ],
    ),
    (
        "django",
        &[
            "Explain Django ORM querysets and lazy evaluation.",
            "How does middleware work in Django?",
            "What are class-based views vs function-based views?",
            "How do you manage migrations and schema changes?",
        ],
    ),
    (
        "flask",
        &[
            "How do blueprints help structure Flask apps?",
            "How would you handle configuration per environment?",
            "Explain request context vs application context.",
        ],
    ),
    (
        "javascript",
        &[
            "Explain the event loop and microtasks in JavaScript.",
            "What is the difference between var, let, and const?",
            "What is a closure and what is a practical use-case?",
        ],
    ),
    (
        "typescript",
        &[
            "What is the difference between an interface and a type alias?",
            "How do generics improve type safety in TypeScript?",
            "Explain union types and type narrowing.",
        ],
    ),
    (
        "react",
        &[
            "When do you use useMemo and useCallback?",
            "Explain reconciliation and keys in lists.",
            "How would you manage global state?",
        ],
    ),
    (
        "node",
        &[
            "Explain Node's event-driven architecture.",
            "How do streams work in Node.js?",
            "What is cluster mode and when would you use it?",
        ],
    ),
    (
        "postgresql",
        &[
            "Explain indexes and when they might hurt performance.",
            "How do transactions and isolation levels work?",
            "What is a CTE and when would you use it?",
        ],
    ),
    (
        "mongodb",
        &[
            "How do you design schemas in a document database?",
            "Explain aggregation pipeline basics.",
            "When would you prefer embedded vs referenced documents?",
        ],
    ),
    (
        "docker",
        &[
            "What is the difference between an image and a container?",
            "How do multi-stage builds reduce image size?",
            "How do you persist data across container restarts?",
        ],
    ),
    (
        "kubernetes",
        &[
            "Explain deployments vs statefulsets.",
            "How does a service route traffic to pods?",
            "What are liveness and readiness probes?",
        ],
    ),
    (
        "tensorflow",
        &[
            "Explain eager execution vs graph mode.",
            "How do you prevent overfitting in deep networks?",
            "What is transfer learning and when would you use it?",
        ],
    ),
    (
        "pytorch",
        &[
            "Explain autograd and computational graphs.",
            "How do you manage device placement (CPU/GPU)?",
            "Describe the DataLoader and Dataset abstractions.",
        ],
    ),
    (
        "scikit-learn",
        &[
            "How do you handle class imbalance?",
            "What is the difference between bagging and boosting?",
            "What is cross-validation and why is it important?",
        ],
    ),
    (
        "go",
        &[
            "How do goroutines differ from OS threads?",
            "When would you use a buffered channel over an unbuffered one?",
            "How does the context package help with cancellation?",
        ],
    ),
    (
        "rust",
        &[
            "Explain ownership and borrowing, and what the borrow checker prevents.",
            "When would you reach for Rc<RefCell<T>> versus Arc<Mutex<T>>?",
            "How do traits and generics combine to give zero-cost abstractions?",
        ],
    ),
    (
        "java",
        &[
            "Explain how garbage collection works in the JVM.",
            "What is the difference between checked and unchecked exceptions?",
            "How do equals and hashCode interact in collections?",
        ],
    ),
    (
        "aws",
        &[
            "How would you choose between EC2, ECS, and Lambda for a service?",
            "Explain IAM roles vs users and the principle of least privilege.",
            "How do you design for failure across availability zones?",
        ],
    ),
];

const GENERIC_QUESTIONS: &[&str] = &[
    "Describe a challenging bug you solved and its impact.",
    "How do you ensure code quality and readability?",
    "Explain a system you designed end-to-end.",
    "How do you approach testing a new feature?",
    "Tell me about a technical decision you would make differently today.",
];

/// Immutable keyword -> questions table.
#[derive(Debug)]
pub struct QuestionBank {
    by_keyword: HashMap<&'static str, &'static [&'static str]>,
    generic: &'static [&'static str],
}

static DEFAULT_BANK: Lazy<QuestionBank> = Lazy::new(|| QuestionBank {
    by_keyword: TECH_QUESTIONS.iter().copied().collect(),
    generic: GENERIC_QUESTIONS,
});

impl QuestionBank {
    /// The process-wide bank.
    pub fn global() -> &'static QuestionBank {
        &DEFAULT_BANK
    }

    /// Questions for an exact keyword, in authored order. Empty for unknown
    /// keywords.
    pub fn questions_for(&self, keyword: &str) -> &[&'static str] {
        self.by_keyword.get(keyword).copied().unwrap_or(&[])
    }

    pub fn generic(&self) -> &[&'static str] {
        self.generic
    }

    pub fn knows(&self, keyword: &str) -> bool {
        self.by_keyword.contains_key(keyword)
    }

    #[cfg(test)]
    pub fn from_parts(
        by_keyword: &[(&'static str, &'static [&'static str])],
        generic: &'static [&'static str],
    ) -> Self {
        Self {
            by_keyword: by_keyword.iter().copied().collect(),
            generic,
        }
    }
}
