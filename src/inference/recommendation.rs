//! Fixed advice templates returned with forest-based recommendations

use crate::data::Diagnosis;
use serde::{Deserialize, Serialize};

pub const MALIGNANT_ADVICE: &str = "\
Urgent Recommendations:
- Consult an oncologist promptly to discuss surgery, chemotherapy, radiation, targeted therapy or immunotherapy; seek a second opinion if needed.
- Complete biopsy and staging to establish whether the disease is localized or has spread.
- Consider genetic testing (BRCA1/BRCA2) when there is a family history.

Treatment-Based Recommendations:
- Surgery: lumpectomy or mastectomy.
- Radiation therapy after surgery to eliminate remaining cancer cells.
- Chemotherapy for aggressive or spreading disease.
- Hormone therapy for ER+/PR+ tumours (e.g. tamoxifen, aromatase inhibitors).
- Targeted therapy for HER2+ tumours (e.g. trastuzumab).

Lifestyle & Support Recommendations:
- Diet: more antioxidants, omega-3 and fibre; fewer processed and high-sugar foods.
- Stay physically active while avoiding excessive strain.
- Use support groups, therapy or counselling.
- Get guidance on insurance, treatment funding and caregiver support.

Follow-Up Care:
- Frequent doctor visits, every few months during the first years.
- Regular scans and blood tests to monitor progress.
- Adhere to long-term hormone therapy or medication when prescribed.
";

pub const BENIGN_ADVICE: &str = "\
General Recommendations:
- Regular monitoring: periodic breast exams and imaging (ultrasound or mammogram) as advised.
- Healthy lifestyle: balanced diet, regular exercise, limited alcohol and no smoking.
- Monthly breast self-examination to detect changes.
- Discuss risks with a doctor when on hormone therapy.
- Manage stress with yoga, meditation or mindfulness.

When to Seek Medical Attention Again:
- New lumps, pain, or changes in breast size or shape.
- Nipple discharge or skin changes such as redness or dimpling.
- Any other unusual breast symptoms.
";

/// Advice text for a diagnosis
pub fn advice_for(diagnosis: Diagnosis) -> &'static str {
    match diagnosis {
        Diagnosis::Malignant => MALIGNANT_ADVICE,
        Diagnosis::Benign => BENIGN_ADVICE,
    }
}

/// Forest-based advice for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub diagnosis: Diagnosis,
    pub advice: String,
    /// Highest averaged class probability of the forest
    pub confidence: f64,
}

impl Recommendation {
    pub fn new(diagnosis: Diagnosis, confidence: f64) -> Self {
        Self {
            diagnosis,
            advice: advice_for(diagnosis).to_string(),
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_by_branch() {
        let malignant = Recommendation::new(Diagnosis::Malignant, 0.9);
        assert!(malignant.advice.starts_with("Urgent Recommendations:"));
        assert!(malignant.advice.contains("Follow-Up Care:"));

        let benign = Recommendation::new(Diagnosis::Benign, 0.8);
        assert!(benign.advice.starts_with("General Recommendations:"));
        assert!(benign.advice.contains("When to Seek Medical Attention Again:"));
    }
}
