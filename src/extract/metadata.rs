//! Workbook Metadata Parser Module
//!
//! XLSX内部のXMLファイルから、calamineのセル読み出しと別系統で必要になる
//! 情報を抽出するモジュール。シートの表示状態、Excelテーブルの定義
//! （displayNameと範囲）、1904年エポック判定を提供します。
//!
//! テーブル定義はワークシートXMLの`<tableParts>`からリレーションシップを
//! 辿って`xl/tables/*.xml`を解決します。シート名とワークシートファイルの
//! 対応は`xl/workbook.xml`と`xl/_rels/workbook.xml.rels`から取得します。

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::api::SheetVisibility;
use crate::error::XlsxJsonError;
use crate::security::{validate_archive, ArchiveLimits};
use crate::types::CellRange;

/// Excelテーブル1つ分の定義
#[derive(Debug, Clone)]
pub(crate) struct TableMeta {
    /// テーブル名（displayName属性を優先）
    pub name: String,
    /// 範囲文字列（table要素のref属性そのまま）
    pub ref_text: String,
    /// 解析済みの範囲。ref属性が不正な場合は`None`。
    pub range: Option<CellRange>,
}

/// workbook.xmlの`<sheet>`要素1つ分
#[derive(Debug, Clone)]
struct SheetRef {
    name: String,
    rel_id: Option<String>,
    state: SheetVisibility,
}

/// ワークブックメタデータパーサー
///
/// XLSXファイル（ZIPアーカイブ）からXMLを直接解析します。
/// 解析前にアーカイブ全体のセキュリティ検証を行います。
#[derive(Debug, Clone)]
pub(crate) struct WorkbookMetadata {
    /// シート名 -> 表示状態
    sheet_states: HashMap<String, SheetVisibility>,
    /// シート名 -> テーブル定義（tablePartsの出現順）
    tables: HashMap<String, Vec<TableMeta>>,
    /// 1904年エポックを使用するかどうか
    is_1904: bool,
}

impl WorkbookMetadata {
    /// XLSXアーカイブからメタデータを解析
    pub fn parse<R: Read + Seek>(
        reader: R,
        limits: &ArchiveLimits,
    ) -> Result<Self, XlsxJsonError> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| XlsxJsonError::Zip(format!("{}", e)))?;

        validate_archive(&mut archive, limits)?;

        // 1. xl/workbook.xml を解析（シート定義と1904年フラグ）
        let (sheet_refs, is_1904) = Self::parse_workbook(&mut archive)?;

        // 2. xl/_rels/workbook.xml.rels を解析（rId -> ワークシートパス）
        let workbook_rels = match read_entry(&mut archive, "xl/_rels/workbook.xml.rels")? {
            Some(bytes) => Self::parse_relationships(&bytes)?,
            None => HashMap::new(),
        };

        // 3. 各ワークシートのtablePartsからテーブルXMLを解決
        let mut sheet_states = HashMap::new();
        let mut tables: HashMap<String, Vec<TableMeta>> = HashMap::new();

        for sheet in sheet_refs {
            sheet_states.insert(sheet.name.clone(), sheet.state);

            let sheet_path = match sheet
                .rel_id
                .as_ref()
                .and_then(|rid| workbook_rels.get(rid))
            {
                Some(target) => resolve_target("xl", target),
                None => continue,
            };

            let sheet_rels = match read_entry(&mut archive, &rels_path_for(&sheet_path))? {
                Some(bytes) => Self::parse_relationships(&bytes)?,
                None => HashMap::new(),
            };

            let part_ids = match read_entry(&mut archive, &sheet_path)? {
                Some(bytes) => Self::parse_table_parts(&bytes)?,
                None => Vec::new(),
            };

            let base_dir = parent_dir(&sheet_path);
            let mut metas = Vec::new();
            for part_id in part_ids {
                let table_path = match sheet_rels.get(&part_id) {
                    Some(target) => resolve_target(base_dir, target),
                    None => {
                        log::warn!(
                            "Table relationship '{}' not found for sheet '{}'",
                            part_id,
                            sheet.name
                        );
                        continue;
                    }
                };

                if let Some(bytes) = read_entry(&mut archive, &table_path)? {
                    if let Some(meta) = Self::parse_table_xml(&bytes)? {
                        metas.push(meta);
                    }
                }
            }

            if !metas.is_empty() {
                tables.insert(sheet.name, metas);
            }
        }

        Ok(Self {
            sheet_states,
            tables,
            is_1904,
        })
    }

    /// シートの表示状態を取得（未知のシートはVisible）
    pub fn visibility(&self, sheet_name: &str) -> SheetVisibility {
        self.sheet_states
            .get(sheet_name)
            .copied()
            .unwrap_or_default()
    }

    /// シートに宣言されたテーブル定義を取得（宣言順）
    pub fn tables_for(&self, sheet_name: &str) -> &[TableMeta] {
        self.tables
            .get(sheet_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 1904年エポックを使用するかどうかを取得
    pub fn is_1904(&self) -> bool {
        self.is_1904
    }

    /// xl/workbook.xml の解析（プライベート）
    ///
    /// `<sheet name=".." state=".." r:id=".."/>` と
    /// `<workbookPr date1904="true"/>` を読み取ります。
    fn parse_workbook<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> Result<(Vec<SheetRef>, bool), XlsxJsonError> {
        let bytes = match read_entry(archive, "xl/workbook.xml")? {
            Some(bytes) => bytes,
            None => return Ok((Vec::new(), false)),
        };

        let mut reader = Reader::from_reader(bytes.as_slice());
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();
        let mut is_1904 = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"sheet" => {
                        let mut name = None;
                        let mut rel_id = None;
                        let mut state = SheetVisibility::Visible;

                        for attr in e.attributes() {
                            let attr = attr.map_err(|e| {
                                XlsxJsonError::Config(format!("XML attribute error: {}", e))
                            })?;
                            match attr.key.as_ref() {
                                b"name" => {
                                    let value = attr.decode_and_unescape_value(&reader).map_err(|e| {
                                        XlsxJsonError::Config(format!("XML text error: {}", e))
                                    })?;
                                    name = Some(value.into_owned());
                                }
                                b"state" => {
                                    let value = std::str::from_utf8(&attr.value)?;
                                    state = SheetVisibility::from_state(value);
                                }
                                b"r:id" => {
                                    rel_id = Some(std::str::from_utf8(&attr.value)?.to_string());
                                }
                                _ => {}
                            }
                        }

                        if let Some(name) = name {
                            sheets.push(SheetRef {
                                name,
                                rel_id,
                                state,
                            });
                        }
                    }
                    b"workbookPr" => {
                        for attr in e.attributes() {
                            let attr = attr.map_err(|e| {
                                XlsxJsonError::Config(format!("XML attribute error: {}", e))
                            })?;
                            if attr.key.as_ref() == b"date1904" {
                                let value = std::str::from_utf8(&attr.value)?;
                                is_1904 = value == "1" || value == "true";
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XlsxJsonError::Config(format!("XML parse error: {}", e)))
                }
                _ => {}
            }
        }

        Ok((sheets, is_1904))
    }

    /// リレーションシップファイルを解析（Id -> Target）
    fn parse_relationships(bytes: &[u8]) -> Result<HashMap<String, String>, XlsxJsonError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut relationships = HashMap::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.name().as_ref() == b"Relationship" {
                        let mut id = None;
                        let mut target = None;

                        for attr in e.attributes() {
                            let attr = attr.map_err(|e| {
                                XlsxJsonError::Config(format!("XML attribute error: {}", e))
                            })?;
                            match attr.key.as_ref() {
                                b"Id" => {
                                    id = Some(std::str::from_utf8(&attr.value)?.to_string());
                                }
                                b"Target" => {
                                    target = Some(std::str::from_utf8(&attr.value)?.to_string());
                                }
                                _ => {}
                            }
                        }

                        if let (Some(id), Some(target)) = (id, target) {
                            relationships.insert(id, target);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XlsxJsonError::Config(format!("XML parse error: {}", e)))
                }
                _ => {}
            }
        }

        Ok(relationships)
    }

    /// ワークシートXMLから`<tablePart r:id=".."/>`を出現順に収集
    fn parse_table_parts(bytes: &[u8]) -> Result<Vec<String>, XlsxJsonError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut part_ids = Vec::new();
        let mut in_table_parts = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let name = e.name();
                    if name.as_ref() == b"tableParts" {
                        in_table_parts = true;
                        continue;
                    }
                    if in_table_parts && name.as_ref() == b"tablePart" {
                        for attr in e.attributes() {
                            let attr = attr.map_err(|e| {
                                XlsxJsonError::Config(format!("XML attribute error: {}", e))
                            })?;
                            if attr.key.as_ref() == b"r:id" {
                                part_ids.push(std::str::from_utf8(&attr.value)?.to_string());
                            }
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"tableParts" {
                        in_table_parts = false;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XlsxJsonError::Config(format!("XML parse error: {}", e)))
                }
                _ => {}
            }
        }

        Ok(part_ids)
    }

    /// xl/tables/*.xml から名前と範囲を解析
    fn parse_table_xml(bytes: &[u8]) -> Result<Option<TableMeta>, XlsxJsonError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.name().as_ref() != b"table" {
                        continue;
                    }

                    let mut display_name = None;
                    let mut fallback_name = None;
                    let mut ref_text = String::new();

                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| {
                            XlsxJsonError::Config(format!("XML attribute error: {}", e))
                        })?;
                        match attr.key.as_ref() {
                            b"displayName" => {
                                let value = attr.decode_and_unescape_value(&reader).map_err(|e| {
                                    XlsxJsonError::Config(format!("XML text error: {}", e))
                                })?;
                                display_name = Some(value.into_owned());
                            }
                            b"name" => {
                                let value = attr.decode_and_unescape_value(&reader).map_err(|e| {
                                    XlsxJsonError::Config(format!("XML text error: {}", e))
                                })?;
                                fallback_name = Some(value.into_owned());
                            }
                            b"ref" => {
                                ref_text = std::str::from_utf8(&attr.value)?.to_string();
                            }
                            _ => {}
                        }
                    }

                    let range = CellRange::parse(&ref_text).filter(CellRange::is_normalized);
                    return Ok(Some(TableMeta {
                        name: display_name.or(fallback_name).unwrap_or_default(),
                        ref_text,
                        range,
                    }));
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XlsxJsonError::Config(format!("XML parse error: {}", e)))
                }
                _ => {}
            }
        }

        Ok(None)
    }
}

/// アーカイブからエントリを読み込む。存在しなければ`None`。
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, XlsxJsonError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(_) => return Ok(None),
    };

    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

/// リレーションシップのTargetをアーカイブ内パスへ解決
///
/// Targetは基準ディレクトリからの相対パスで、`../`による親参照と
/// 先頭`/`の絶対形を許容します。
fn resolve_target(base_dir: &str, target: &str) -> String {
    let trimmed = target.trim_start_matches('/');
    if trimmed.starts_with("xl/") {
        return trimmed.to_string();
    }

    let mut dir: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    let mut rest = trimmed;
    while let Some(stripped) = rest.strip_prefix("../") {
        dir.pop();
        rest = stripped;
    }
    dir.push(rest);
    dir.join("/")
}

/// ワークシートパスから対応するリレーションシップファイルのパスを構築
fn rels_path_for(sheet_path: &str) -> String {
    match sheet_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", sheet_path),
    }
}

/// パスの親ディレクトリ部分を取得
fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}
