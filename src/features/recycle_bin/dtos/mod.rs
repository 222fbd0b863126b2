mod recycle_bin_dto;

pub use recycle_bin_dto::{
    PurgeResponseDto, RecycleBinEntryDto, RestoreOutcomeDto, RestoreStatusDto,
};
