// ==========================================
// Campagnes médicales - Chargement des fichiers
// ==========================================
// Formats: Excel (.xlsx/.xls) / OpenDocument (.ods) / CSV (.csv)
// Sortie: lignes brutes positionnelles, première ligne = en-têtes,
//         chacune avec son numéro de ligne dans le fichier
// ==========================================

use crate::importer::error::{ImportError, ImporterResult};
use calamine::{Data, Ods, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

/// Ligne brute: cellules texte dans l'ordre du fichier
pub type RawRow = Vec<String>;

/// Délimiteurs candidats, par ordre de préférence en cas d'égalité
const CSV_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Lignes échantillonnées pour la détection du délimiteur
const SAMPLE_LINES: usize = 5;

// ==========================================
// FileKind - format déclaré
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
    Xls,
    Ods,
}

impl FileKind {
    /// Format à partir de l'extension déclarée (avec ou sans point)
    pub fn from_extension(extension: &str) -> ImporterResult<Self> {
        let ext = extension.trim().trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" | "xlsm" => Ok(FileKind::Xlsx),
            "xls" => Ok(FileKind::Xls),
            "ods" => Ok(FileKind::Ods),
            _ => Err(ImportError::UnsupportedFormat(extension.to_string())),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Csv => write!(f, "CSV"),
            FileKind::Xlsx => write!(f, "XLSX"),
            FileKind::Xls => write!(f, "XLS"),
            FileKind::Ods => write!(f, "ODS"),
        }
    }
}

// ==========================================
// LoadedSheet - contenu chargé
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSheet {
    /// rows[0] = en-têtes
    pub rows: Vec<RawRow>,
    /// Numéro de ligne fichier de chaque entrée de `rows`
    lines: Vec<usize>,
    /// Délimiteur retenu (CSV uniquement)
    pub delimiter: Option<char>,
}

impl LoadedSheet {
    /// Construit la feuille en retirant les lignes vides de fin
    ///
    /// # Retour
    /// - Err(EmptyFile): aucune ligne ou en-tête entièrement vide
    fn from_rows(
        mut rows: Vec<RawRow>,
        mut lines: Vec<usize>,
        delimiter: Option<char>,
    ) -> ImporterResult<Self> {
        while rows
            .last()
            .map(|r| r.iter().all(|c| c.trim().is_empty()))
            .unwrap_or(false)
        {
            rows.pop();
        }
        lines.truncate(rows.len());

        match rows.first() {
            Some(header) if header.iter().any(|c| !c.trim().is_empty()) => Ok(Self {
                rows,
                lines,
                delimiter,
            }),
            _ => Err(ImportError::EmptyFile),
        }
    }

    pub fn headers(&self) -> &[String] {
        self.rows.first().map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Lignes de données avec leur numéro de ligne dans le fichier
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &RawRow)> {
        self.lines.iter().copied().zip(self.rows.iter()).skip(1)
    }

    /// Numéro de ligne fichier des en-têtes
    pub fn header_line(&self) -> usize {
        self.lines.first().copied().unwrap_or(1)
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// Analyse le contenu complet d'un fichier
    fn parse_bytes(&self, bytes: Vec<u8>) -> ImporterResult<LoadedSheet>;
}

// ==========================================
// CSV Parser
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// UTF-8 (BOM retiré), sinon Latin-1 octet par octet
    fn decode(bytes: Vec<u8>) -> String {
        let bytes = match bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
            Some(rest) => rest.to_vec(),
            None => bytes,
        };
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => {
                debug!("CSV non UTF-8, décodage Latin-1");
                err.into_bytes().iter().map(|b| *b as char).collect()
            }
        }
    }
}

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: Vec<u8>) -> ImporterResult<LoadedSheet> {
        let content = Self::decode(bytes);
        let delimiter = detect_delimiter(&content);
        debug!(delimiter = %(delimiter as char).escape_debug(), "délimiteur CSV retenu");

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // lignes de longueurs différentes tolérées
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        // Les lignes vides sont sautées par le lecteur: la position
        // de chaque enregistrement donne la vraie ligne
        let mut rows = Vec::new();
        let mut lines = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(rows.len() + 1);
            lines.push(line);
            rows.push(record.iter().map(|v| v.trim().to_string()).collect());
        }

        LoadedSheet::from_rows(rows, lines, Some(delimiter as char))
    }
}

/// Choisit le délimiteur parmi {`,` `;` tab `|`}
///
/// Score sur les 5 premières lignes non vides: part des lignes ayant le
/// même nombre de colonnes que l'en-tête, bonus si toutes identiques,
/// bonus si 3 à 20 colonnes. Virgule par défaut.
pub fn detect_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect();

    if sample.is_empty() {
        return b',';
    }
    let sample = sample.join("\n");

    let mut best = (b',', 0.0_f64);
    for delimiter in CSV_DELIMITERS {
        let score = score_delimiter(&sample, delimiter);
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    best.0
}

fn score_delimiter(sample: &str, delimiter: u8) -> f64 {
    let counts: Vec<usize> = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(sample.as_bytes())
        .records()
        .filter_map(Result::ok)
        .map(|r| r.len())
        .collect();

    let Some(&reference) = counts.first() else {
        return 0.0;
    };
    if reference <= 1 {
        return 0.0;
    }

    let consistent = counts.iter().filter(|c| **c == reference).count();
    let mut score = consistent as f64 / counts.len() as f64 * 10.0;
    if consistent == counts.len() {
        score += 5.0;
    }
    if (3..=20).contains(&reference) {
        score += 3.0;
    }
    score + reference.min(20) as f64 * 0.1
}

// ==========================================
// Excel / ODS Parser
// ==========================================
pub struct ExcelParser {
    kind: FileKind,
}

impl ExcelParser {
    pub fn new(kind: FileKind) -> Self {
        Self { kind }
    }

    /// Première feuille du classeur, chaque cellule exportée en texte
    fn read_first_sheet<R>(mut workbook: R) -> ImporterResult<(Vec<RawRow>, Vec<usize>)>
    where
        R: Reader<Cursor<Vec<u8>>>,
        R::Error: fmt::Display,
    {
        let range = match workbook.worksheet_range_at(0) {
            Some(Ok(range)) => range,
            Some(Err(e)) => return Err(ImportError::FileFormat(e.to_string())),
            None => return Err(ImportError::FileFormat("classeur sans feuille".to_string())),
        };

        Ok(rows_from_range(&range))
    }
}

/// Lignes d'une plage avec leur numéro de ligne dans la feuille
///
/// La plage commence à la première cellule non vide: les lignes vides
/// du haut de la feuille sont comptées via `start()`.
fn rows_from_range(range: &Range<Data>) -> (Vec<RawRow>, Vec<usize>) {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    range
        .rows()
        .enumerate()
        .map(|(idx, row)| {
            let cells: RawRow = row.iter().map(cell_to_text).collect();
            (cells, first_row + idx + 1)
        })
        .unzip()
}

impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: Vec<u8>) -> ImporterResult<LoadedSheet> {
        let cursor = Cursor::new(bytes);
        let (rows, lines) = match self.kind {
            FileKind::Xlsx => Self::read_first_sheet(
                Xlsx::new(cursor).map_err(|e| ImportError::FileFormat(e.to_string()))?,
            )?,
            FileKind::Xls => Self::read_first_sheet(
                Xls::new(cursor).map_err(|e| ImportError::FileFormat(e.to_string()))?,
            )?,
            FileKind::Ods => Self::read_first_sheet(
                Ods::new(cursor).map_err(|e| ImportError::FileFormat(e.to_string()))?,
            )?,
            FileKind::Csv => return CsvParser.parse_bytes(cursor.into_inner()),
        };

        LoadedSheet::from_rows(rows, lines, None)
    }
}

/// Cellule → texte
///
/// Les dates restent des numéros de série (parsés plus tard) et les
/// nombres entiers perdent leur « .0 » (téléphones saisis en nombre).
pub fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(e) => e.to_string(),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

// ==========================================
// Chargeur universel (selon l'extension déclarée)
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// Charge depuis un flux + extension déclarée
    pub fn parse_reader<R: Read>(&self, mut reader: R, extension: &str) -> ImporterResult<LoadedSheet> {
        let kind = FileKind::from_extension(extension)?;

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        debug!(kind = %kind, size = bytes.len(), "fichier lu");
        match kind {
            FileKind::Csv => CsvParser.parse_bytes(bytes),
            other => ExcelParser::new(other).parse_bytes(bytes),
        }
    }

    /// Charge un fichier du disque (extension = extension du chemin)
    pub fn parse_path<P: AsRef<Path>>(&self, path: P) -> ImporterResult<LoadedSheet> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        // Extension refusée avant toute lecture
        FileKind::from_extension(&extension)?;

        let file = File::open(path)?;
        self.parse_reader(file, &extension)
    }
}
