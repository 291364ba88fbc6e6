//! Solidity ABI surface of the contracts the codec talks to or compresses calls for.

use alloy_sol_types::sol;

sol! {
    interface IBLSPublicKeyRegistry {
        event BLSPublicKeyRegistered(uint256 indexed id, bytes32 indexed blsPublicKeyHash);

        function register(uint256[4] blsPublicKey) external;
        function lookup(uint256 id) external view returns (uint256[4]);
    }

    interface IAddressRegistry {
        event AddressRegistered(uint256 indexed id, address indexed addr);

        function register(address addr) external;
        function addresses(uint256 id) external view returns (address);
    }

    /// Maps expander contracts to the index used in compressed bundles.
    interface IBLSExpanderDelegator {
        event ExpanderRegistered(uint256 indexed id, address indexed expanderAddress);

        function registerExpander(address expanderAddress) external;
        function expanders(uint256 id) external view returns (address);
    }

    interface IAggregatorUtilities {
        function sendEthToTxOrigin() external payable;
    }

    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
    }
}
