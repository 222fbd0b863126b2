mod profile_dto;

pub use profile_dto::{
    DeactivateAccountDto, DeactivateAccountResponseDto, SetPinDto, UpdateProfileDto,
    UserProfileDto,
};
