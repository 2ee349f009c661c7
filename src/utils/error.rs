use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClsError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Empty label set: at least one sample is required")]
    EmptyLabelSet,

    #[error("Unknown phase: '{0}', expected one of train, val, test")]
    UnknownPhase(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),
}

impl ClsError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ClsError::ShapeMismatch(_) => "SHAPE_MISMATCH",
            ClsError::EmptyLabelSet => "EMPTY_LABEL_SET",
            ClsError::UnknownPhase(_) => "UNKNOWN_PHASE",
            ClsError::InvalidInput(_) => "INVALID_INPUT",
            ClsError::Config(_) => "CONFIG_ERROR",
            ClsError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            ClsError::Io(_) => "IO_ERROR",
            ClsError::Json(_) => "JSON_ERROR",
            ClsError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
        }
    }

    /// 是否为调用方输入错误（而非环境/IO错误）
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ClsError::ShapeMismatch(_)
                | ClsError::EmptyLabelSet
                | ClsError::UnknownPhase(_)
                | ClsError::InvalidInput(_)
                | ClsError::Config(_)
        )
    }

    /// 进程退出码：调用方输入错误为2，其余为1
    pub fn exit_code(&self) -> u8 {
        if self.is_caller_error() {
            2
        } else {
            1
        }
    }
}
