use std::io::{BufRead, Write};
use tracing::debug;

use crate::error::{HeartError, Result};

const FEATURE_DESCRIPTIONS: [(&str, &str); 13] = [
    ("age", "Age in years"),
    ("sex", "Sex (1 = male; 0 = female)"),
    ("cp", "Chest pain type (0-3)"),
    ("trestbps", "Resting blood pressure (in mm Hg)"),
    ("chol", "Serum cholesterol in mg/dl"),
    ("fbs", "Fasting blood sugar > 120 mg/dl (1 = true; 0 = false)"),
    ("restecg", "Resting electrocardiographic results (0-2)"),
    ("thalach", "Maximum heart rate achieved"),
    ("exang", "Exercise induced angina (1 = yes; 0 = no)"),
    ("oldpeak", "ST depression induced by exercise relative to rest"),
    ("slope", "The slope of the peak exercise ST segment (0-2)"),
    ("ca", "Number of major vessels (0-4) colored by fluoroscopy"),
    (
        "thal",
        "Thalassemia (0 = normal; 1 = fixed defect; 2 = reversible defect)",
    ),
];

pub fn feature_description(feature: &str) -> Option<&'static str> {
    FEATURE_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == feature)
        .map(|(_, description)| *description)
}

pub fn parse_value(input: &str) -> Result<f64> {
    let trimmed = input.trim();

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| HeartError::InvalidInputValue {
            value: trimmed.to_string(),
        })
}

fn prompt_text(feature: &str) -> String {
    format!(
        "Enter value for {feature} ({}): ",
        feature_description(feature).unwrap_or_default()
    )
}

/// Asks for each feature in order, re-prompting on anything that is not a
/// number. Ends with [`HeartError::InputClosed`] if input runs out.
pub fn read_feature_vector<R: BufRead, W: Write>(
    feature_names: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<Vec<f64>> {
    writeln!(output, "--- Please Enter Patient Data ---")?;
    writeln!(
        output,
        "You will be asked for {} medical features.",
        feature_names.len()
    )?;

    let mut values = Vec::with_capacity(feature_names.len());
    let mut line = Vec::new();

    for feature in feature_names {
        loop {
            write!(output, "{}", prompt_text(feature))?;
            output.flush()?;

            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                return Err(HeartError::InputClosed {
                    feature: feature.clone(),
                });
            }

            match parse_value(&String::from_utf8_lossy(&line)) {
                Ok(value) => {
                    values.push(value);
                    break;
                }
                Err(err) => {
                    debug!(%feature, "rejected feature value");
                    writeln!(output, "{err}")?;
                }
            }
        }
    }

    Ok(values)
}

pub fn parse_value_list(list: &str, expected: usize) -> Result<Vec<f64>> {
    let values = list
        .split(',')
        .map(parse_value)
        .collect::<Result<Vec<f64>>>()?;

    if values.len() != expected {
        return Err(HeartError::DimensionMismatch {
            expected,
            actual: values.len(),
        });
    }

    Ok(values)
}
