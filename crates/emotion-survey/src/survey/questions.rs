use serde::Serialize;

/// A single yes/no prompt read out to the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u8,
    pub prompt: &'static str,
}

/// Ordered, immutable list of survey questions. Ids run from 1 to `len()`.
#[derive(Debug, Clone, Copy)]
pub struct QuestionSet {
    questions: &'static [Question],
}

impl QuestionSet {
    pub fn standard() -> Self {
        Self {
            questions: &STANDARD_QUESTIONS,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &'static [Question] {
        self.questions
    }

    pub fn get(&self, id: u8) -> Option<&'static Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    /// Narrows a raw client-provided id to a question id when it is in range.
    pub fn resolve(&self, raw: i64) -> Option<u8> {
        let id = u8::try_from(raw).ok()?;
        self.get(id).map(|question| question.id)
    }
}

impl Default for QuestionSet {
    fn default() -> Self {
        Self::standard()
    }
}

const STANDARD_QUESTIONS: [Question; 8] = [
    Question {
        id: 1,
        prompt: "Dia foi satisfatório?",
    },
    Question {
        id: 2,
        prompt: "Teve energia suficiente?",
    },
    Question {
        id: 3,
        prompt: "Foi produtivo?",
    },
    Question {
        id: 4,
        prompt: "Carga de trabalho justa?",
    },
    Question {
        id: 5,
        prompt: "Sentiu-se valorizado?",
    },
    Question {
        id: 6,
        prompt: "Comunicação foi clara?",
    },
    Question {
        id: 7,
        prompt: "Desafios estimulantes?",
    },
    Question {
        id: 8,
        prompt: "Fez pausas adequadas?",
    },
];
