use regex::Regex;
use std::sync::OnceLock;

/// Whole-word, case-insensitive replacements applied in order.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    // materials
    ("Fibra de Vidrio", "Fibra Vid"),
    ("Poliestireno", "Poliestir"),
    ("Aislamiento", "Aisl"),
    ("Térmico", "Term"),
    ("Termico", "Term"),
    ("Accesorios", "Acc"),
    ("Dimensiones", "Dim"),
    ("Construcción", "Const"),
    ("Construccion", "Const"),
    ("Material", "Mat"),
    ("Resistencia", "Resist"),
    ("Galvanizado", "Galv"),
    ("Inoxidable", "Inox"),
    ("Autorroscante", "Autorrosc"),
    ("Cerradura", "Cerr"),
    // colors
    ("Blanco", "Blco"),
    ("Negro", "Neg"),
    ("Azul", "Az"),
    ("Rojo", "Rj"),
    ("Verde", "Vrd"),
    ("Amarillo", "Amar"),
    ("Naranja", "Nar"),
    // units
    ("Pulgadas", "in"),
    ("Centímetros", "cm"),
    ("Centimetros", "cm"),
    ("Metros", "m"),
    ("Milímetros", "mm"),
    ("Milimetros", "mm"),
    ("Piezas", "pz"),
    ("Unidades", "un"),
    // filler
    ("Precio", "P"),
    ("Especial", "Esp"),
    ("Premium", "Prem"),
    ("Standard", "Std"),
    ("Professional", "Prof"),
    ("Profesional", "Prof"),
];

fn compiled() -> &'static [(Regex, &'static str)] {
    static TABLE: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        ABBREVIATIONS
            .iter()
            .filter_map(|(word, short)| {
                match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))) {
                    Ok(re) => Some((re, *short)),
                    Err(err) => {
                        tracing::warn!(word, error = %err, "skipping abbreviation");
                        None
                    }
                }
            })
            .collect()
    })
}

/// Apply every abbreviation in [`ABBREVIATIONS`].
pub fn abbreviate(title: &str) -> String {
    let mut out = title.to_string();
    for (re, short) in compiled() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *short).into_owned();
        }
    }
    out
}
