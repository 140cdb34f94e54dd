use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    catalog::Catalog,
    models::RegistrationDetailType,
};

pub const EXPORT_FAILED_MESSAGE: &str = "데이터 내보내기에 실패했습니다.";

/**
 * Column headers of the export, in column order.
 */
const HEADERS: [&str; 10] = ["번호", "이름", "성별", "주소", "연락처", "생년월일", "생활구분", "프로그램", "개인정보동의", "접수일시"];

const SHEET_NAME: &str = "접수목록";

/**
 * Maximum number of characters a spreadsheet cell holds.
 */
const MAX_CELL_CHARS: usize = 32_767;

/**
 * A registration with codes replaced by display labels, as shown to administrators.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRegistration {
    #[serde(rename = "번호")]
    pub id: i64,
    #[serde(rename = "이름")]
    pub name: String,
    #[serde(rename = "성별")]
    pub gender: String,
    #[serde(rename = "주소")]
    pub address: String,
    #[serde(rename = "연락처")]
    pub phone: String,
    #[serde(rename = "생년월일")]
    pub birthdate: String,
    #[serde(rename = "생활구분")]
    pub living_type: String,
    #[serde(rename = "프로그램")]
    pub program: String,
    #[serde(rename = "개인정보동의")]
    pub privacy_agreement: String,
    #[serde(rename = "접수일시")]
    pub registration_date: String,
}

impl LabeledRegistration {
    fn cells(&self) -> [&str; 9] {
        [
            self.name.as_str(),
            self.gender.as_str(),
            self.address.as_str(),
            self.phone.as_str(),
            self.birthdate.as_str(),
            self.living_type.as_str(),
            self.program.as_str(),
            self.privacy_agreement.as_str(),
            self.registration_date.as_str(),
        ]
    }
}

/**
 * Builds administrator exports of the registrations.
 */
pub struct ExportService {
    catalog: Catalog,
    export_directory: PathBuf,
}

impl ExportService {
    /**
     * Creates a new instance of `ExportService`.
     *
     * # Arguments
     * `catalog`: Lookup tables used for labeling.
     * `export_directory`: Directory receiving a copy of each spreadsheet.
     */
    pub fn new(catalog: Catalog, export_directory: impl Into<PathBuf>) -> Self {
        ExportService { catalog, export_directory: export_directory.into() }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /**
     * Replaces codes with labels. Order is kept.
     */
    pub fn label(&self, registrations: &[RegistrationDetailType]) -> Vec<LabeledRegistration> {
        registrations
            .iter()
            .map(|registration| LabeledRegistration {
                id: registration.id,
                name: registration.name.clone(),
                gender: self.catalog.gender_label(&registration.gender).to_string(),
                address: registration.address.clone(),
                phone: registration.phone.clone(),
                birthdate: registration.birthdate.clone(),
                living_type: self.catalog.living_type_label(&registration.living_type).to_string(),
                program: self.catalog.program_label(&registration.program).to_string(),
                privacy_agreement: if registration.privacy_agreement { "동의" } else { "미동의" }.to_string(),
                registration_date: registration.registration_date.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .collect()
    }

    /**
     * Renders labeled registrations as a single sheet workbook.
     *
     * # Returns
     * The xlsx file contents.
     */
    pub fn build_workbook(&self, rows: &[LabeledRegistration]) -> Result<Vec<u8>, ApplicationError> {
        Self::write_workbook(rows).map_err(|err| {
            tracing::error!("Failed to build spreadsheet: {}", err);
            ApplicationError::new(ErrorType::Export, EXPORT_FAILED_MESSAGE)
        })
    }

    fn write_workbook(rows: &[LabeledRegistration]) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;
        for (column, header) in (0u16..).zip(HEADERS) {
            worksheet.write_with_format(0, column, header, &header_format)?;
            worksheet.set_column_width(column, 16)?;
        }
        for (row, registration) in (1u32..).zip(rows) {
            #[allow(clippy::cast_precision_loss)]
            worksheet.write_number(row, 0, registration.id as f64)?;
            for (column, value) in (1u16..).zip(registration.cells()) {
                worksheet.write_string(row, column, truncate_cell(value))?;
            }
        }
        workbook.save_to_buffer()
    }

    /**
     * Stores a copy of the spreadsheet in the export directory. Existing files are never
     * overwritten or cleaned up: a name already taken gets a numeric suffix.
     *
     * # Arguments
     * `contents`: The xlsx file contents.
     * `created_at`: Timestamp used in the file name.
     *
     * # Returns
     * The path of the written file.
     */
    pub async fn write_export_file(&self, contents: &[u8], created_at: DateTime<Utc>) -> Result<PathBuf, ApplicationError> {
        let path = Self::write_new_file(&self.export_directory, &export_file_name(created_at), contents).await.map_err(|err| {
            tracing::error!("Failed to write export file in {}: {}", self.export_directory.display(), err);
            ApplicationError::new(ErrorType::Export, EXPORT_FAILED_MESSAGE)
        })?;
        tracing::info!("Export written to {}", path.display());
        Ok(path)
    }

    async fn write_new_file(directory: &Path, file_name: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(directory).await?;
        let stem = file_name.trim_end_matches(".xlsx");
        let mut suffix = 0u32;
        loop {
            let path = if suffix == 0 { directory.join(file_name) } else { directory.join(format!("{stem}_{suffix}.xlsx")) };
            match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(contents).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(err) => return Err(err),
            }
        }
    }
}

/**
 * Cuts cell text to what a spreadsheet cell can hold, on a character boundary.
 */
fn truncate_cell(value: &str) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}

/**
 * Dated file name of a spreadsheet export.
 */
pub fn export_file_name(created_at: DateTime<Utc>) -> String {
    format!("registrations_{}.xlsx", created_at.with_timezone(&Local).format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn registration(id: i64, gender: &str, living_type: &str, program: &str) -> RegistrationDetailType {
        RegistrationDetailType {
            id,
            name: "홍길동".to_string(),
            gender: gender.to_string(),
            address: "서울시 강남구".to_string(),
            phone: "010-1234-5678".to_string(),
            birthdate: "1990-01-01".to_string(),
            living_type: living_type.to_string(),
            program: program.to_string(),
            privacy_agreement: true,
            registration_date: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_label_registrations() {
        let service = ExportService::new(Catalog::default(), "./exports");
        let rows = service.label(&[registration(2, "female", "lowIncome", "ballet"), registration(1, "other", "unknown", "성인요가")]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 2);
        assert_eq!(rows[0].gender, "여성");
        assert_eq!(rows[0].living_type, "차상위");
        assert_eq!(rows[0].program, "유아발레교실");
        assert_eq!(rows[0].privacy_agreement, "동의");
        assert_eq!(rows[1].gender, "other");
        assert_eq!(rows[1].living_type, "unknown");
        assert_eq!(rows[1].program, "성인요가");
    }

    #[test]
    fn test_labeled_registration_uses_korean_keys() {
        let service = ExportService::new(Catalog::default(), "./exports");
        let rows = service.label(&[registration(1, "male", "general", "yoga")]);
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["이름"], "홍길동");
        assert_eq!(json["성별"], "남성");
        assert_eq!(json["생활구분"], "일반");
        assert_eq!(json["프로그램"], "요가");
        assert_eq!(json["번호"], 1);
    }

    #[test]
    fn test_build_workbook() {
        let service = ExportService::new(Catalog::default(), "./exports");
        let rows = service.label(&[registration(1, "male", "general", "yoga")]);
        let contents = service.build_workbook(&rows).unwrap();
        assert!(contents.starts_with(b"PK"));
        let empty = service.build_workbook(&[]).unwrap();
        assert!(empty.starts_with(b"PK"));
    }

    #[test]
    fn test_export_file_name() {
        let name = export_file_name(Utc::now());
        assert!(name.starts_with("registrations_"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(name.len(), "registrations_YYYYMMDD_HHMMSS.xlsx".len());
    }

    #[test]
    fn test_truncate_cell() {
        assert_eq!(truncate_cell("서울시 강남구"), "서울시 강남구");
        let long = "가".repeat(MAX_CELL_CHARS + 10);
        let truncated = truncate_cell(&long);
        assert_eq!(truncated.chars().count(), MAX_CELL_CHARS);
        assert!(long.starts_with(truncated));
    }

    #[test]
    fn test_build_workbook_with_oversized_field() {
        let service = ExportService::new(Catalog::default(), "./exports");
        let mut oversized = registration(1, "male", "general", "yoga");
        oversized.address = "a".repeat(40_000);
        let rows = service.label(&[oversized, registration(2, "female", "basic", "art")]);
        let contents = service.build_workbook(&rows).unwrap();
        assert!(contents.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_exports_in_the_same_second_accumulate() {
        let directory = std::env::temp_dir().join(format!("welfare_registration_export_{}", uuid::Uuid::new_v4()));
        let service = ExportService::new(Catalog::default(), &directory);
        let created_at = Utc::now();
        let first = service.write_export_file(b"first", created_at).await.unwrap();
        let second = service.write_export_file(b"second", created_at).await.unwrap();
        let third = service.write_export_file(b"third", created_at).await.unwrap();
        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(tokio::fs::read(&first).await.unwrap(), b"first");
        assert_eq!(tokio::fs::read(&second).await.unwrap(), b"second");
        assert!(second.to_string_lossy().ends_with("_1.xlsx"));
        assert!(third.to_string_lossy().ends_with("_2.xlsx"));
        tokio::fs::remove_dir_all(&directory).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_export_file() {
        let directory = std::env::temp_dir().join(format!("welfare_registration_export_{}", uuid::Uuid::new_v4()));
        let service = ExportService::new(Catalog::default(), &directory);
        let path = service.write_export_file(b"contents", Utc::now()).await.unwrap();
        assert!(path.starts_with(&directory));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"contents");
        tokio::fs::remove_dir_all(&directory).await.unwrap();
    }
}
