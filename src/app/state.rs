use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{Action, SessionConfig};
use crate::buffer::{ByteSource, Document};
use crate::error::{Error, Result};
use crate::locator;
use crate::tag::{Tag, TagRole, TagStore, TagType, codec};
use crate::value::{self, Value};

/// 1つのファイルと1つのタグファイルを扱うセッション
pub struct Session {
    /// 設定
    config: SessionConfig,
    /// 解析中のドキュメント
    document: Option<Document>,
    /// タグ
    tags: TagStore,
    /// 最後に読み書きしたタグファイル
    tag_path: Option<PathBuf>,
    /// カーソル位置
    cursor: usize,
    /// 選択範囲（両端を含む）
    selection: Option<(usize, usize)>,
    /// カーソル位置を含むタグ
    current_tags: Vec<usize>,
    /// 前回のオフセット検索結果（次を検索用）
    last_match: Option<usize>,
    /// ステータスメッセージ
    status_message: Option<String>,
}

impl Session {
    /// 新しいセッションを作成
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            document: None,
            tags: TagStore::new(config.orientation),
            tag_path: None,
            cursor: 0,
            selection: None,
            current_tags: Vec::new(),
            last_match: None,
            status_message: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// ファイルを開く
    pub fn open(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let document = if self.config.mmap {
            Document::open_mapped(path.clone())?
        } else {
            Document::open(path.clone())?
        };
        info!(
            path = %path.display(),
            len = document.len(),
            mapped = document.is_mapped(),
            "opened source"
        );
        self.load_document(document);
        Ok(())
    }

    /// バイト列から読み込み（標準入力用）
    pub fn load_bytes(&mut self, data: Vec<u8>) {
        self.load_document(Document::from_bytes(data));
    }

    fn load_document(&mut self, document: Document) {
        self.document = Some(document);
        self.cursor = 0;
        self.selection = None;
        self.last_match = None;
        self.current_tags = self.tags.containing(self.cursor);
    }

    /// 開いているドキュメント
    pub fn document(&self) -> Result<&Document> {
        self.document.as_ref().ok_or(Error::NoSource)
    }

    /// ファイル名を取得
    pub fn filename(&self) -> Option<&str> {
        self.document.as_ref().and_then(Document::filename)
    }

    pub fn tags(&self) -> &TagStore {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagStore {
        &mut self.tags
    }

    pub fn tag_path(&self) -> Option<&Path> {
        self.tag_path.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    /// カーソル位置を含むタグの位置
    pub fn current_tags(&self) -> &[usize] {
        &self.current_tags
    }

    pub fn last_match(&self) -> Option<usize> {
        self.last_match
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// タグファイルを読み込む。失敗したら今のタグはそのまま残る
    pub fn load_tags(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if let Err(err) = codec::read_file(&mut self.tags, &path) {
            warn!(path = %path.display(), error = %err, "failed to load tags");
            return Err(err);
        }
        info!(path = %path.display(), count = self.tags.len(), "loaded tags");
        self.tag_path = Some(path);
        self.current_tags = self.tags.containing(self.cursor);
        Ok(())
    }

    /// タグファイルに保存。パス省略時は前回のファイル
    pub fn save_tags(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.tag_path.clone().ok_or(Error::NoTagPath)?,
        };
        codec::write_file(&self.tags, &path)?;
        info!(path = %path.display(), count = self.tags.len(), "saved tags");
        self.tag_path = Some(path.clone());
        Ok(path)
    }

    /// カーソルを移動し、その位置を含むタグを返す
    pub fn move_cursor(&mut self, offset: usize) -> Result<&[usize]> {
        let len = self.document()?.len();
        self.cursor = offset.min(len.saturating_sub(1));
        self.current_tags = self.tags.containing(self.cursor);
        Ok(&self.current_tags)
    }

    /// 範囲を選択（両端を含む、順不同）
    pub fn select(&mut self, start: usize, end: usize) -> Result<()> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let len = self.document()?.len();
        if end >= len {
            return Err(Error::OutOfRange {
                offset: start,
                count: (end - start).saturating_add(1),
                len,
            });
        }
        self.selection = Some((start, end));
        Ok(())
    }

    /// 選択解除
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// タグの範囲を選択
    pub fn select_tag(&mut self, position: usize) -> Result<()> {
        let tag = self.tags.tag_at(position)?;
        let (start, end) = (tag.start(), tag.end());
        self.select(start, end)
    }

    /// 選択範囲のバイト列。選択がなければカーソル位置の1バイト
    pub fn selected_bytes(&self) -> Result<&[u8]> {
        let document = self.document()?;
        let (start, end) = self.selection.unwrap_or((self.cursor, self.cursor));
        document.read(start, end - start + 1)
    }

    /// 選択範囲からタグを作成して末尾に追加
    pub fn create_tag(
        &mut self,
        name: impl Into<String>,
        kind: TagType,
        role: TagRole,
        comment: impl Into<String>,
    ) -> Result<usize> {
        self.document()?;
        let (start, end) = self.selection.unwrap_or((self.cursor, self.cursor));
        let tag = Tag::new()
            .with_name(name)
            .with_range(start, end)
            .with_type(kind)
            .with_role(role)
            .with_comment(comment);
        debug!(tag = tag.name(), start, end, %kind, %role, "created tag");
        let position = self.tags.append(tag);
        self.current_tags = self.tags.containing(self.cursor);
        Ok(position)
    }

    /// タグを削除
    pub fn delete_tag(&mut self, position: usize) -> Result<Tag> {
        let len = self.tags.len();
        let mut removed = self.tags.remove(position..position.saturating_add(1))?;
        self.current_tags = self.tags.containing(self.cursor);
        removed.pop().ok_or(Error::IndexOutOfRange { index: position, len })
    }

    /// 役割が Count のタグ（配列の要素数候補）
    pub fn count_tags(&self) -> Vec<usize> {
        self.tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| tag.role() == TagRole::Count)
            .map(|(position, _)| position)
            .collect()
    }

    /// タグの値を読む
    pub fn tag_value(&self, position: usize) -> Result<Value> {
        let tag = self.tags.tag_at(position)?;
        let bytes = self.document()?.read(tag.start(), tag.len())?;
        value::decode(bytes, tag.tag_type(), self.config.endian)
    }

    /// 全タグの値
    pub fn tag_values(&self) -> Vec<Result<Value>> {
        (0..self.tags.len()).map(|position| self.tag_value(position)).collect()
    }

    /// 選択範囲を絶対オフセットとして読み、カーソルをそこへ移動
    pub fn show_absolute_offset(&mut self) -> Result<usize> {
        let offset = locator::decode_offset(self.selected_bytes()?, self.config.endian)?;
        let len = self.document()?.len();
        if offset >= len {
            return Err(Error::OutOfRange {
                offset,
                count: 1,
                len,
            });
        }
        self.cursor = offset;
        self.current_tags = self.tags.containing(offset);
        debug!(offset, "jumped to absolute offset");
        Ok(offset)
    }

    /// カーソル位置を表す整数を先頭から検索
    pub fn find_offset(&mut self) -> Result<Option<usize>> {
        let needle = self.offset_needle()?;
        let found = locator::find(self.document()?, &needle, 0);
        self.record_match(found, needle.len());
        Ok(found)
    }

    /// 前回の一致の後ろから再検索
    pub fn find_again(&mut self) -> Result<Option<usize>> {
        let Some(previous) = self.last_match else {
            return self.find_offset();
        };
        let needle = self.offset_needle()?;
        let found = locator::find_again(self.document()?, &needle, previous);
        self.record_match(found, needle.len());
        Ok(found)
    }

    /// 前回の一致より前を検索
    pub fn find_previous(&mut self) -> Result<Option<usize>> {
        let needle = self.offset_needle()?;
        let document = self.document()?;
        let before = self.last_match.unwrap_or(document.len());
        let found = locator::find_prev(document, &needle, before);
        self.record_match(found, needle.len());
        Ok(found)
    }

    fn offset_needle(&self) -> Result<Vec<u8>> {
        value::encode_unsigned(self.cursor as u64, self.config.offset_width, self.config.endian)
    }

    fn record_match(&mut self, found: Option<usize>, width: usize) {
        match found {
            Some(pos) => {
                self.last_match = Some(pos);
                self.selection = Some((pos, pos + width - 1));
                debug!(offset = self.cursor, pos, "offset reference found");
                self.status_message = Some(format!("Found at {:08X}", pos));
            }
            None => {
                debug!(offset = self.cursor, "no more offset references");
                self.status_message = Some("Not found".to_string());
            }
        }
    }

    /// アクションを実行
    pub fn execute(&mut self, action: Action) -> Result<()> {
        self.status_message = None;

        match action {
            Action::Open(path) => {
                self.open(path)?;
                self.status_message = self.filename().map(|name| format!("Opened {}", name));
            }
            Action::LoadTags(path) => {
                self.load_tags(path)?;
                self.status_message = Some(format!("Loaded {} tags", self.tags.len()));
            }
            Action::SaveTags(path) => {
                let path = self.save_tags(path.as_deref())?;
                self.status_message = Some(format!("Saved {}", path.display()));
            }
            Action::MoveCursor(offset) => {
                self.move_cursor(offset)?;
            }
            Action::Select(start, end) => self.select(start, end)?,
            Action::ClearSelection => self.clear_selection(),
            Action::SelectTag(position) => self.select_tag(position)?,
            Action::CreateTag {
                name,
                kind,
                role,
                comment,
            } => {
                let position = self.create_tag(name, kind, role, comment)?;
                self.status_message = Some(format!("Created tag {}", position));
            }
            Action::DeleteTag(position) => {
                let tag = self.delete_tag(position)?;
                self.status_message = Some(format!("Deleted tag {}", tag.name()));
            }
            Action::ShowAbsoluteOffset => {
                let offset = self.show_absolute_offset()?;
                self.status_message = Some(format!("Offset {:08X}", offset));
            }
            Action::FindOffset => {
                self.find_offset()?;
            }
            Action::FindAgain => {
                self.find_again()?;
            }
            Action::FindPrevious => {
                self.find_previous()?;
            }
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
