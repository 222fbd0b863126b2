mod share_dto;

pub use share_dto::{
    IncomingShareDto, OutgoingShareDto, ShareCandidateDto, ShareCandidatesQuery, ShareFileDto,
    ShareFileResponseDto, ShareRecipientResultDto, ShareRemovedDto, SharedAccessDto,
};
