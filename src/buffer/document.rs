use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use memmap2::Mmap;

use super::ByteSource;
use crate::error::Result;

/// バッファの実体
enum Backing {
    /// メモリ上に読み込んだデータ
    Owned(Vec<u8>),
    /// メモリマップしたファイル
    Mapped(Mmap),
}

/// 読み取り専用のバイナリドキュメント
pub struct Document {
    /// ファイルパス
    path: Option<PathBuf>,
    /// バッファデータ
    data: Backing,
}

impl Document {
    /// 空のドキュメントを作成
    pub fn new() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// バイト列から作成
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            path: None,
            data: Backing::Owned(data),
        }
    }

    /// ファイルから読み込み
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = File::open(&path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        Ok(Self {
            path: Some(path),
            data: Backing::Owned(data),
        })
    }

    /// ファイルをメモリマップして開く
    ///
    /// 空ファイルはマップできないため通常の読み込みになる
    pub fn open_mapped(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self {
                path: Some(path),
                data: Backing::Owned(Vec::new()),
            });
        }
        // SAFETY: ドキュメントは読み取り専用。外部からの書き換えは想定しない
        let map = unsafe { Mmap::map(&file)? };

        Ok(Self {
            path: Some(path),
            data: Backing::Mapped(map),
        })
    }

    /// 指定位置のバイトを取得
    pub fn get(&self, pos: usize) -> Option<u8> {
        self.data().get(pos).copied()
    }

    /// メモリマップされているかどうか
    pub fn is_mapped(&self) -> bool {
        matches!(self.data, Backing::Mapped(_))
    }

    /// ファイルパスを取得
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// ファイル名を取得
    pub fn filename(&self) -> Option<&str> {
        self.path.as_ref().and_then(|p| p.file_name()).and_then(|s| s.to_str())
    }

    /// 生データへの参照を取得
    pub fn data(&self) -> &[u8] {
        match &self.data {
            Backing::Owned(data) => data,
            Backing::Mapped(map) => map,
        }
    }
}

impl ByteSource for Document {
    fn as_bytes(&self) -> &[u8] {
        self.data()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
