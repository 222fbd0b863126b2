mod file_dto;

pub use file_dto::{
    AccessGrantDto, DeleteFileResponseDto, DownloadQuery, FileResponseDto, ScanStatusDto,
    ScanSubmittedDto, UnblockRequestedDto, UploadFileDto, VerifyOtpDto, VerifyPinDto,
};
