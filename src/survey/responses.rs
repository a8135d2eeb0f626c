use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Deserialize};

use super::{catalog, QuestionCatalog, Result, ValidationError};

/// Answers keyed by question ID.
pub type ResponseMap = HashMap<String, u8>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub question_id: String,
    pub value: u8,
}

/// Per-session answer set. Every write is checked against the catalog.
#[derive(Clone)]
pub struct ResponseStore {
    catalog: &'static QuestionCatalog,
    values: ResponseMap,
}

impl ResponseStore {
    pub fn new() -> Self {
        Self::with_catalog(catalog())
    }

    pub fn with_catalog(catalog: &'static QuestionCatalog) -> Self {
        Self {
            catalog,
            values: HashMap::new(),
        }
    }

    /// Build a store from a batch of answers, reporting every invalid one.
    pub fn from_responses<I>(responses: I) -> Result<Self>
    where
        I: IntoIterator<Item = Response>,
    {
        let mut store = Self::new();
        let errors: Vec<ValidationError> = responses
            .into_iter()
            .filter_map(|r| store.record(&r.question_id, r.value).err())
            .collect();

        match ValidationError::from_list(errors) {
            Some(err) => Err(err),
            None => Ok(store),
        }
    }

    /// Record an answer, replacing any earlier answer to the same question.
    pub fn record(&mut self, question_id: &str, value: u8) -> Result<Option<u8>> {
        let question = self
            .catalog
            .get(question_id)
            .ok_or_else(|| ValidationError::UnknownQuestion(question_id.to_string()))?;

        if !question.scale.contains(value) {
            return Err(ValidationError::OutOfScale {
                question_id: question_id.to_string(),
                value,
                min: question.scale.min,
                max: question.scale.max,
            });
        }

        Ok(self.values.insert(question_id.to_string(), value))
    }

    pub fn remove(&mut self, question_id: &str) -> Option<u8> {
        self.values.remove(question_id)
    }

    pub fn get(&self, question_id: &str) -> Option<u8> {
        self.values.get(question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn catalog(&self) -> &'static QuestionCatalog {
        self.catalog
    }

    /// Unanswered questions, in catalog order.
    pub fn missing(&self) -> Vec<&'static str> {
        self.catalog
            .questions()
            .filter(|q| !self.values.contains_key(&q.id))
            .map(|q| q.id.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.catalog
            .questions()
            .all(|q| self.values.contains_key(&q.id))
    }

    pub fn raw(&self) -> &ResponseMap {
        &self.values
    }

    /// Answer values in catalog order, comma separated. Two submissions with
    /// the same pattern gave identical answers.
    pub fn answer_pattern(&self) -> String {
        self.catalog
            .questions()
            .map(|q| self.values.get(&q.id).map_or_else(|| "-".to_string(), |v| v.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Answers in catalog order.
    pub fn to_responses(&self) -> Vec<Response> {
        self.catalog
            .questions()
            .filter_map(|q| {
                self.values.get(&q.id).map(|value| Response {
                    question_id: q.id.clone(),
                    value: *value,
                })
            })
            .collect()
    }
}

impl Default for ResponseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ResponseStore {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.catalog, other.catalog) && self.values == other.values
    }
}

impl fmt::Debug for ResponseStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStore")
            .field("answered", &self.values.len())
            .field("total", &self.catalog.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_rejects_unknown_question() {
        let mut store = ResponseStore::new();
        let err = store.record("bm_people_99", 4).unwrap_err();
        assert_eq!(err, ValidationError::UnknownQuestion("bm_people_99".to_string()));
        assert!(store.is_empty());
    }

    #[test]
    fn record_rejects_values_outside_declared_scale() {
        let mut store = ResponseStore::new();
        assert!(store.record("bm_people_1", 7).is_ok());
        assert!(matches!(
            store.record("bm_people_1", 8),
            Err(ValidationError::OutOfScale { max: 7, .. })
        ));
        // influence items are on a five point scale
        assert!(matches!(
            store.record("ig_1", 6),
            Err(ValidationError::OutOfScale { max: 5, .. })
        ));
        assert!(matches!(store.record("ig_1", 0), Err(ValidationError::OutOfScale { .. })));
        assert_eq!(store.get("bm_people_1"), Some(7));
    }

    #[test]
    fn repeated_answer_overwrites() {
        let mut store = ResponseStore::new();
        assert_eq!(store.record("lmx_1", 3).unwrap(), None);
        assert_eq!(store.record("lmx_1", 6).unwrap(), Some(3));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("lmx_1"), Some(6));
    }

    #[test]
    fn from_responses_collects_every_error() {
        let err = ResponseStore::from_responses(vec![
            Response { question_id: "nope".to_string(), value: 1 },
            Response { question_id: "lmx_1".to_string(), value: 9 },
            Response { question_id: "lmx_2".to_string(), value: 4 },
        ])
        .unwrap_err();
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn missing_and_complete_track_catalog() {
        let mut store = ResponseStore::new();
        assert_eq!(store.missing().len(), 43);
        for q in catalog().questions() {
            store.record(&q.id, q.scale.min).unwrap();
        }
        assert!(store.is_complete());
        assert!(store.missing().is_empty());
        store.remove("ig_12");
        assert_eq!(store.missing(), vec!["ig_12"]);
    }

    #[test]
    fn to_responses_follows_catalog_order() {
        let mut store = ResponseStore::new();
        store.record("lmx_2", 4).unwrap();
        store.record("bm_people_1", 5).unwrap();
        let ids: Vec<_> = store.to_responses().into_iter().map(|r| r.question_id).collect();
        assert_eq!(ids, vec!["bm_people_1", "lmx_2"]);
    }

    #[test]
    fn answer_pattern_depends_on_values_not_insertion_order() {
        let mut a = ResponseStore::new();
        a.record("lmx_2", 4).unwrap();
        a.record("bm_people_1", 5).unwrap();
        let mut b = ResponseStore::new();
        b.record("bm_people_1", 5).unwrap();
        b.record("lmx_2", 4).unwrap();
        assert_eq!(a.answer_pattern(), b.answer_pattern());
        assert!(a.answer_pattern().starts_with("5,-,"));

        b.record("lmx_2", 3).unwrap();
        assert_ne!(a.answer_pattern(), b.answer_pattern());
    }
}
