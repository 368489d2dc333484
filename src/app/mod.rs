mod state;

pub use state::Session;

use std::path::PathBuf;

use crate::tag::{Orientation, TagRole, TagType};
use crate::value::Endian;

/// セッション設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// 数値を読むときのバイトオーダー
    pub endian: Endian,
    /// オフセット検索で使う整数の幅（バイト数）
    pub offset_width: usize,
    /// ファイルをメモリマップで開くか
    pub mmap: bool,
    /// タグ一覧の向き
    pub orientation: Orientation,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endian: Endian::Little,
            offset_width: 4,
            mmap: false,
            orientation: Orientation::TagPerRow,
        }
    }
}

/// UIから届く操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ファイル
    Open(PathBuf),
    LoadTags(PathBuf),
    /// None なら前回のタグファイルへ保存
    SaveTags(Option<PathBuf>),

    // カーソル・選択
    MoveCursor(usize),
    /// 選択範囲（両端を含む）
    Select(usize, usize),
    ClearSelection,
    /// タグの範囲を選択
    SelectTag(usize),

    // タグ
    CreateTag {
        name: String,
        kind: TagType,
        role: TagRole,
        comment: String,
    },
    DeleteTag(usize),

    // オフセット
    /// 選択範囲を絶対オフセットとして読み、そこへ移動
    ShowAbsoluteOffset,
    /// カーソル位置を指す値を検索
    FindOffset,
    /// 次を検索
    FindAgain,
    /// 前を検索
    FindPrevious,
}
