use crate::models::MedicalImage;

/// A patient record with its ordered image collection.
#[derive(Debug, Clone)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub birth_year: i32,
    pub gender: String,
    pub medical_record_number: String,
    pub images: Vec<MedicalImage>,
}

impl Patient {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            birth_year: 0,
            gender: String::new(),
            medical_record_number: String::new(),
            images: Vec::new(),
        }
    }

    pub fn with_birth_year(mut self, year: i32) -> Self {
        self.birth_year = year;
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = gender.into();
        self
    }

    pub fn with_record_number(mut self, mrn: impl Into<String>) -> Self {
        self.medical_record_number = mrn.into();
        self
    }

    pub fn with_images(mut self, images: Vec<MedicalImage>) -> Self {
        self.images = images;
        self
    }

    /// Case-insensitive match against name or medical record number,
    /// used by repository search.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.medical_record_number.to_lowercase().contains(&term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_matches_name_and_record_number() {
        let patient = Patient::new("p1", "Jane Doe").with_record_number("MR001");
        assert!(patient.matches_search("jane"));
        assert!(patient.matches_search("mr001"));
        assert!(patient.matches_search("DOE"));
        assert!(!patient.matches_search("smith"));
    }
}
