use crate::models::{Material, Module, PLACEHOLDER, Semester, Unit, Year, YearStructure};

const LESSONS_PER_MODULE: usize = 3;
const EXAMS_PER_MODULE: usize = 2;

fn placeholder_materials(prefix: &str, count: usize) -> Vec<Material> {
    (1..=count)
        .map(|i| Material {
            id: format!("{}-{:03}", prefix, i),
            title: PLACEHOLDER.to_string(),
            drive_url: PLACEHOLDER.to_string(),
            module_id: None,
        })
        .collect()
}

fn placeholder_module(id: String, is_shared: bool, is_standalone: bool) -> Module {
    Module {
        id,
        title: PLACEHOLDER.to_string(),
        is_shared,
        is_standalone,
        unit_id: None,
        standalone_year_id: None,
        lessons: placeholder_materials("les", LESSONS_PER_MODULE),
        exams: placeholder_materials("ex", EXAMS_PER_MODULE),
    }
}

fn semester(id: &str, label: &str, only_prefix: &str) -> Semester {
    let shared = (1..=6).map(|i| placeholder_module(format!("mod-y1-shared-{:03}", i), true, false));
    let only = (1..=3).map(|i| placeholder_module(format!("{}-{:03}", only_prefix, i), false, false));

    Semester {
        id: id.to_string(),
        label: label.to_string(),
        year_id: None,
        modules: shared.chain(only).collect(),
    }
}

fn units(year: u8, count: usize) -> Vec<Unit> {
    (1..=count)
        .map(|i| Unit {
            id: format!("unit-{}-{}", year, i),
            label: PLACEHOLDER.to_string(),
            year_id: None,
            modules: (1..=2)
                .map(|m| placeholder_module(format!("mod-y{}-u{}-{:03}", year, i, m), false, false))
                .collect(),
        })
        .collect()
}

/// The catalog shipped with the site before any content is entered: three
/// years, every title and link a placeholder.
pub fn default_catalog() -> Vec<Year> {
    vec![
        Year {
            id: "year-1".to_string(),
            label: "السنة الأولى".to_string(),
            color: "#0D9488".to_string(),
            icon: "BookOpen".to_string(),
            structure: YearStructure::Semesters,
            semesters: vec![
                semester("s1", "الفصل الأول", "mod-y1-s1"),
                semester("s2", "الفصل الثاني", "mod-y1-s2"),
            ],
            units: Vec::new(),
            standalone_modules: Vec::new(),
        },
        Year {
            id: "year-2".to_string(),
            label: "السنة الثانية".to_string(),
            color: "#16A34A".to_string(),
            icon: "FlaskConical".to_string(),
            structure: YearStructure::Units,
            semesters: Vec::new(),
            units: units(2, 5),
            standalone_modules: (1..=2)
                .map(|i| placeholder_module(format!("mod-standalone-{:03}", i), false, true))
                .collect(),
        },
        Year {
            id: "year-3".to_string(),
            label: "السنة الثالثة".to_string(),
            color: "#D97706".to_string(),
            icon: "GraduationCap".to_string(),
            structure: YearStructure::Units,
            semesters: Vec::new(),
            units: units(3, 4),
            standalone_modules: Vec::new(),
        },
    ]
}
